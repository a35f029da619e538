use serde::{Serialize, Deserialize};

use crate::data::example::{check_dimension, Example};
use crate::error::Result;
use crate::math::params::Parameters;
use crate::model::Model;

/// A test example the model got wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Misprediction {
    pub index: usize,
    pub true_label: usize,
    pub predicted_label: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Fraction of examples misclassified, in [0, 1].
    pub error_rate: f64,
    /// In example order.
    pub mispredictions: Vec<Misprediction>,
    pub total: usize,
}

impl Evaluation {
    pub fn error_percent(&self) -> f64 {
        100.0 * self.error_rate
    }
}

/// Classifies every example and collects the misses.
///
/// Only the first example's datum length is checked against
/// `input_dimension`.
pub fn evaluate<M: Model + ?Sized>(
    model: &M,
    parameters: &Parameters,
    examples: &[Example],
    input_dimension: usize,
) -> Result<Evaluation> {
    check_dimension(input_dimension, examples, "testing")?;

    let mispredictions: Vec<Misprediction> = examples
        .iter()
        .enumerate()
        .filter_map(|(index, example)| {
            let predicted_label = model.predict(parameters, &example.datum);
            (predicted_label != example.label).then_some(Misprediction {
                index,
                true_label: example.label,
                predicted_label,
            })
        })
        .collect();

    let error_rate = if examples.is_empty() {
        0.0
    } else {
        mispredictions.len() as f64 / examples.len() as f64
    };

    Ok(Evaluation { error_rate, mispredictions, total: examples.len() })
}
