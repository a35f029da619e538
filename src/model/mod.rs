//! Classifier capability set and its two variants.
//!
//! The trainer, aggregator and evaluator only ever talk to [`Model`]; any
//! classifier that can produce initial parameters, per-example gradients and
//! losses, a regularization term, and predictions plugs in unchanged.

pub mod gradcheck;
pub mod mlp;
pub mod regularization;
pub mod softmax;
pub mod spec;

use serde::{Serialize, Deserialize};

use crate::data::example::Example;
use crate::error::{Error, Result};
use crate::math::params::{Gradient, Parameters};

pub use mlp::MlpModel;
pub use softmax::SoftmaxModel;
pub use spec::ModelSpec;

/// Which way the optimizer moves along the velocity.
///
/// `Descend` subtracts it (the gradient is of a loss to minimize); `Ascend`
/// adds it (the gradient is of a log-likelihood to maximize).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSign {
    #[default]
    Descend,
    Ascend,
}

pub trait Model {
    fn name(&self) -> &str;

    /// Number of output classes; labels must lie in `0..num_classes()`.
    fn num_classes(&self) -> usize;

    fn initial_parameters(&self, input_dimension: usize) -> Parameters;

    /// Gradient of `example_loss` for a single example, without regularization.
    fn example_gradient(&self, parameters: &Parameters, example: &Example) -> Gradient;

    fn example_loss(&self, parameters: &Parameters, example: &Example) -> f64;

    fn regularization_gradient(&self, parameters: &Parameters) -> Gradient;

    fn regularization_loss(&self, parameters: &Parameters) -> f64;

    fn predict(&self, parameters: &Parameters, datum: &[f64]) -> usize;

    /// Mean example loss plus the regularization loss. An empty set
    /// contributes only the regularization term.
    fn loss(&self, parameters: &Parameters, examples: &[Example]) -> f64 {
        let classification = if examples.is_empty() {
            0.0
        } else {
            examples.iter().map(|e| self.example_loss(parameters, e)).sum::<f64>()
                / examples.len() as f64
        };
        classification + self.regularization_loss(parameters)
    }

    fn norm(&self, parameters: &Parameters) -> f64 {
        parameters.norm()
    }

    fn distance(&self, a: &Parameters, b: &Parameters) -> f64 {
        a.distance(b)
    }

    fn update_sign(&self) -> UpdateSign {
        UpdateSign::Descend
    }
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn num_classes(&self) -> usize {
        (**self).num_classes()
    }

    fn initial_parameters(&self, input_dimension: usize) -> Parameters {
        (**self).initial_parameters(input_dimension)
    }

    fn example_gradient(&self, parameters: &Parameters, example: &Example) -> Gradient {
        (**self).example_gradient(parameters, example)
    }

    fn example_loss(&self, parameters: &Parameters, example: &Example) -> f64 {
        (**self).example_loss(parameters, example)
    }

    fn regularization_gradient(&self, parameters: &Parameters) -> Gradient {
        (**self).regularization_gradient(parameters)
    }

    fn regularization_loss(&self, parameters: &Parameters) -> f64 {
        (**self).regularization_loss(parameters)
    }

    fn predict(&self, parameters: &Parameters, datum: &[f64]) -> usize {
        (**self).predict(parameters, datum)
    }

    fn loss(&self, parameters: &Parameters, examples: &[Example]) -> f64 {
        (**self).loss(parameters, examples)
    }

    fn norm(&self, parameters: &Parameters) -> f64 {
        (**self).norm(parameters)
    }

    fn distance(&self, a: &Parameters, b: &Parameters) -> f64 {
        (**self).distance(a, b)
    }

    fn update_sign(&self) -> UpdateSign {
        (**self).update_sign()
    }
}

/// Rejects labels the model has no output unit for.
pub fn check_labels<M: Model + ?Sized>(model: &M, examples: &[Example], which: &str) -> Result<()> {
    let classes = model.num_classes();
    match examples.iter().position(|e| e.label >= classes) {
        Some(i) => Err(Error::ShapeMismatch(format!(
            "{} example {} has label {} but the model has {} classes",
            which, i, examples[i].label, classes
        ))),
        None => Ok(()),
    }
}

/// `[1, datum...]`: the constant bias input followed by the datum.
pub(crate) fn with_bias(datum: &[f64]) -> Vec<f64> {
    let mut augmented = Vec::with_capacity(datum.len() + 1);
    augmented.push(1.0);
    augmented.extend_from_slice(datum);
    augmented
}

pub(crate) fn one_hot(label: usize, classes: usize) -> Vec<f64> {
    let mut target = vec![0.0; classes];
    target[label] = 1.0;
    target
}

/// Index of the first maximum element.
pub(crate) fn argmax(v: &[f64]) -> usize {
    v.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_i, best), (i, &x)| {
            if x > best { (i, x) } else { (best_i, best) }
        })
        .0
}
