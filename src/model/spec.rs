use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::error::{Error, Result};
use crate::model::mlp::MlpModel;
use crate::model::regularization::DEFAULT_PENALTY;
use crate::model::softmax::SoftmaxModel;
use crate::model::Model;

fn default_classes() -> usize {
    10
}

fn default_penalty() -> f64 {
    DEFAULT_PENALTY
}

fn default_hidden() -> Vec<usize> {
    vec![64]
}

/// Serializable choice of classifier.
///
/// ```json
/// { "type": "mlp", "hidden_layers": [64], "num_classes": 10 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    Softmax {
        #[serde(default = "default_classes")]
        num_classes: usize,
        #[serde(default = "default_penalty")]
        regularization: f64,
    },
    Mlp {
        #[serde(default = "default_hidden")]
        hidden_layers: Vec<usize>,
        #[serde(default = "default_classes")]
        num_classes: usize,
        #[serde(default)]
        activation: ActivationFunction,
        #[serde(default = "default_penalty")]
        regularization: f64,
        #[serde(default)]
        seed: u64,
    },
}

impl Default for ModelSpec {
    fn default() -> Self {
        ModelSpec::Softmax { num_classes: default_classes(), regularization: default_penalty() }
    }
}

impl ModelSpec {
    pub fn validate(&self) -> Result<()> {
        let (classes, penalty) = match self {
            ModelSpec::Softmax { num_classes, regularization } => (*num_classes, *regularization),
            ModelSpec::Mlp { hidden_layers, num_classes, regularization, .. } => {
                if hidden_layers.is_empty() {
                    return Err(Error::InvalidConfig("an MLP needs at least one hidden layer".into()));
                }
                if hidden_layers.contains(&0) {
                    return Err(Error::InvalidConfig(format!(
                        "hidden layer sizes must be positive, got {:?}",
                        hidden_layers
                    )));
                }
                (*num_classes, *regularization)
            }
        };
        if classes < 2 {
            return Err(Error::InvalidConfig(format!("num_classes must be at least 2, got {}", classes)));
        }
        if !(penalty >= 0.0 && penalty.is_finite()) {
            return Err(Error::InvalidConfig(format!(
                "regularization must be a finite non-negative number, got {}",
                penalty
            )));
        }
        Ok(())
    }

    pub fn build(&self) -> Result<Box<dyn Model>> {
        self.validate()?;
        Ok(match self {
            ModelSpec::Softmax { num_classes, regularization } => {
                Box::new(SoftmaxModel::new(*num_classes).with_regularization(*regularization))
            }
            ModelSpec::Mlp { hidden_layers, num_classes, activation, regularization, seed } => Box::new(
                MlpModel::new(hidden_layers, *num_classes, *activation)
                    .with_regularization(*regularization)
                    .with_seed(*seed),
            ),
        })
    }

    pub fn load_json(path: &std::path::Path) -> Result<ModelSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
