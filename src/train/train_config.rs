use std::sync::mpsc;

use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::optim::schedule::{MomentumRule, MAX_DECREASES_LIMIT};
use crate::train::epoch_stats::TrainEvent;
use crate::train::stop::StopSignal;

/// When a run counts as finished, besides schedule exhaustion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum Termination {
    /// Loss on the signal set drops below `threshold`.
    LossBelow { threshold: f64 },
    /// Parameters move less than `threshold` over one epoch.
    DistanceBelow { threshold: f64 },
    /// Stop after a fixed number of epochs.
    MaxEpochs { epochs: usize },
}

/// Hyperparameters for one training run.
///
/// Every field has a default, so a config file only needs the values it
/// overrides:
///
/// ```json
/// { "minibatch_size": 32, "termination": { "policy": "max_epochs", "epochs": 20 } }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub minibatch_size: usize,
    pub initial_learning_rate: f64,
    pub initial_momentum: f64,
    pub learning_rate_decrease_factor: f64,
    /// An epoch improves when `previous / current >= desired_decrease_ratio`.
    pub desired_decrease_ratio: f64,
    /// Tightenings allowed before the learning-rate floor is passed.
    pub max_decreases: u32,
    pub momentum_rule: MomentumRule,
    pub termination: Termination,
    /// Number of recorded signals needed before the improvement test applies.
    pub min_history: usize,
    pub shuffle_each_epoch: bool,
    /// Seed for per-epoch shuffling.
    pub seed: u64,
    /// Progress cadence in examples; 0 disables progress events.
    pub progress_every: usize,
    /// Retain the parameters of every epoch in the report.
    pub keep_history: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            minibatch_size: 128,
            initial_learning_rate: 0.01,
            initial_momentum: 0.5,
            learning_rate_decrease_factor: 2.0,
            desired_decrease_ratio: 1.1,
            max_decreases: 3,
            momentum_rule: MomentumRule::Halfway,
            termination: Termination::LossBelow { threshold: 0.05 },
            min_history: 3,
            shuffle_each_epoch: false,
            seed: 0,
            progress_every: 1000,
            keep_history: false,
        }
    }
}

impl TrainConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(Error::InvalidConfig(msg));

        if self.minibatch_size == 0 {
            return invalid("minibatch_size must be at least 1".into());
        }
        if !(self.initial_learning_rate > 0.0 && self.initial_learning_rate.is_finite()) {
            return invalid(format!(
                "initial_learning_rate must be positive, got {}",
                self.initial_learning_rate
            ));
        }
        if !(0.0..1.0).contains(&self.initial_momentum) {
            return invalid(format!("initial_momentum must be in [0, 1), got {}", self.initial_momentum));
        }
        if let MomentumRule::Fixed(m) = self.momentum_rule {
            if !(0.0..1.0).contains(&m) {
                return invalid(format!("fixed momentum must be in [0, 1), got {}", m));
            }
        }
        if !(self.learning_rate_decrease_factor > 1.0 && self.learning_rate_decrease_factor.is_finite()) {
            return invalid(format!(
                "learning_rate_decrease_factor must be greater than 1, got {}",
                self.learning_rate_decrease_factor
            ));
        }
        if !(self.desired_decrease_ratio >= 1.0) {
            return invalid(format!(
                "desired_decrease_ratio must be at least 1, got {}",
                self.desired_decrease_ratio
            ));
        }
        if self.max_decreases > MAX_DECREASES_LIMIT {
            return invalid(format!(
                "max_decreases must be at most {}, got {}",
                MAX_DECREASES_LIMIT, self.max_decreases
            ));
        }
        if self.min_history < 2 {
            return invalid(format!("min_history must be at least 2, got {}", self.min_history));
        }
        match self.termination {
            Termination::LossBelow { threshold } | Termination::DistanceBelow { threshold }
                if !(threshold >= 0.0) =>
            {
                invalid(format!("termination threshold must be non-negative, got {}", threshold))
            }
            Termination::MaxEpochs { epochs: 0 } => invalid("max_epochs must be at least 1".into()),
            _ => Ok(()),
        }
    }

    /// Serializes the config to a pretty-printed JSON file.
    pub fn save_json(&self, path: &std::path::Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes and validates a config file.
    pub fn load_json(path: &std::path::Path) -> Result<TrainConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        let config: TrainConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }
}

/// Runtime collaborators that cannot live in a config file.
///
/// - `progress_tx`: receives a `TrainEvent` at the progress cadence and
///   after every epoch. A dropped receiver is ignored.
/// - `stop`: operator cancellation, polled once per epoch.
#[derive(Debug, Clone, Default)]
pub struct TrainHooks {
    pub progress_tx: Option<mpsc::Sender<TrainEvent>>,
    pub stop: Option<StopSignal>,
}

impl TrainHooks {
    pub fn new() -> Self {
        TrainHooks::default()
    }

    pub fn with_progress(mut self, tx: mpsc::Sender<TrainEvent>) -> Self {
        self.progress_tx = Some(tx);
        self
    }

    pub fn with_stop(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config: TrainConfig = serde_json::from_str(
            r#"{ "minibatch_size": 32,
                 "termination": { "policy": "distance_below", "threshold": 0.001 },
                 "momentum_rule": { "fixed": 0.9 } }"#,
        ).unwrap();
        assert_eq!(config.minibatch_size, 32);
        assert_eq!(config.termination, Termination::DistanceBelow { threshold: 0.001 });
        assert_eq!(config.momentum_rule, MomentumRule::Fixed(0.9));
        assert_eq!(config.initial_learning_rate, 0.01);
        assert_eq!(config.max_decreases, 3);
    }

    #[test]
    fn rejects_out_of_domain_values() {
        let bad = [
            TrainConfig { minibatch_size: 0, ..TrainConfig::default() },
            TrainConfig { initial_learning_rate: 0.0, ..TrainConfig::default() },
            TrainConfig { initial_momentum: 1.0, ..TrainConfig::default() },
            TrainConfig { learning_rate_decrease_factor: 1.0, ..TrainConfig::default() },
            TrainConfig { desired_decrease_ratio: 0.9, ..TrainConfig::default() },
            TrainConfig { min_history: 1, ..TrainConfig::default() },
            TrainConfig { max_decreases: MAX_DECREASES_LIMIT + 1, ..TrainConfig::default() },
            TrainConfig { momentum_rule: MomentumRule::Fixed(1.5), ..TrainConfig::default() },
            TrainConfig { termination: Termination::MaxEpochs { epochs: 0 }, ..TrainConfig::default() },
            TrainConfig {
                termination: Termination::LossBelow { threshold: f64::NAN },
                ..TrainConfig::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))), "{:?}", config);
        }
    }

    #[test]
    fn max_decreases_is_accepted_up_to_the_limit() {
        let config = TrainConfig { max_decreases: MAX_DECREASES_LIMIT, ..TrainConfig::default() };
        assert!(config.validate().is_ok());
        let config = TrainConfig { max_decreases: 80, ..TrainConfig::default() };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        let config = TrainConfig {
            shuffle_each_epoch: true,
            termination: Termination::MaxEpochs { epochs: 7 },
            ..TrainConfig::default()
        };
        config.save_json(&path).unwrap();
        assert_eq!(TrainConfig::load_json(&path).unwrap(), config);
    }
}
