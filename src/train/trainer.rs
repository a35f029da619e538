use std::time::Instant;

use log::{debug, info, warn};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::data::example::{check_dimension, input_dimension, Example};
use crate::error::Result;
use crate::math::params::Parameters;
use crate::model::{check_labels, Model};
use crate::optim::momentum::Momentum;
use crate::optim::schedule::{insufficient_improvement, Schedule, Tightening};
use crate::train::aggregate::aggregate;
use crate::train::epoch_stats::{EpochStats, TerminationReason, TrainEvent};
use crate::train::partition::{partition, ProgressCadence};
use crate::train::train_config::{Termination, TrainConfig, TrainHooks};

/// Everything the optimizer owns for the duration of one run.
#[derive(Debug, Clone)]
pub struct OptimizerState {
    pub parameters: Parameters,
    pub momentum: Momentum,
    pub schedule: Schedule,
    /// One convergence signal (loss or distance) per finite epoch.
    pub signal_history: Vec<f64>,
    /// Completed epochs.
    pub epoch: usize,
}

/// Outcome of a finished run.
#[derive(Debug, Clone)]
pub struct TrainReport {
    pub parameters: Parameters,
    pub reason: TerminationReason,
    pub epochs: usize,
    pub signal_history: Vec<f64>,
    pub stats: Vec<EpochStats>,
    /// Parameters at the start of every epoch followed by the final ones;
    /// empty unless `keep_history` is set.
    pub history: Vec<Parameters>,
}

/// Minibatch gradient descent with momentum and an adaptive schedule.
///
/// Each epoch runs every minibatch through the aggregator and a momentum
/// step, then measures a convergence signal and decides between
/// terminating, tightening the schedule, or running another epoch.
pub struct Trainer<'a, M: Model + ?Sized> {
    model: &'a M,
    config: &'a TrainConfig,
    hooks: TrainHooks,
    state: OptimizerState,
    rng: StdRng,
}

impl<'a, M: Model + ?Sized> Trainer<'a, M> {
    pub fn new(model: &'a M, config: &'a TrainConfig, hooks: TrainHooks, input_dimension: usize) -> Result<Self> {
        config.validate()?;
        let state = OptimizerState {
            parameters: model.initial_parameters(input_dimension),
            momentum: Momentum::new(),
            schedule: Schedule::new(
                config.initial_learning_rate,
                config.initial_momentum,
                config.learning_rate_decrease_factor,
                config.max_decreases,
                config.momentum_rule,
            ),
            signal_history: Vec::new(),
            epoch: 0,
        };
        Ok(Trainer {
            model,
            config,
            hooks,
            state,
            rng: StdRng::seed_from_u64(config.seed),
        })
    }

    pub fn state(&self) -> &OptimizerState {
        &self.state
    }

    /// One pass over `training`. Returns the update ratio of the last
    /// minibatch.
    pub fn run_epoch(&mut self, training: &[Example]) -> Option<f64> {
        let epoch = self.state.epoch + 1;
        let learning_rate = self.state.schedule.learning_rate();
        let momentum = self.state.schedule.momentum();
        let sign = self.model.update_sign();

        let mut order: Vec<&Example> = training.iter().collect();
        if self.config.shuffle_each_epoch {
            order.shuffle(&mut self.rng);
        }

        let total = order.len();
        let mut cadence = ProgressCadence::new(self.config.progress_every);
        let mut consumed = 0;
        let mut update_ratio = None;

        for minibatch in partition(&order, self.config.minibatch_size) {
            let gradient = aggregate(self.model, &self.state.parameters, minibatch);

            let norm = self.model.norm(&self.state.parameters);
            update_ratio = (norm > 0.0).then(|| learning_rate * self.model.norm(&gradient) / norm);

            let velocity = self.state.momentum.update(&gradient, learning_rate, momentum);
            self.state.parameters = Momentum::apply(&self.state.parameters, velocity, sign);

            consumed += minibatch.len();
            if cadence.advance(consumed) {
                debug!("epoch {}: {}/{} examples", epoch, consumed, total);
                self.emit(TrainEvent::Progress { epoch, consumed, total });
            }
        }

        update_ratio
    }

    /// Runs epochs until a termination condition holds.
    ///
    /// The loss signal is measured on `validation`, or on `training` when
    /// `validation` is empty.
    pub fn train(mut self, training: &[Example], validation: &[Example]) -> Result<TrainReport> {
        let dimension = input_dimension(training, "training")?;
        self.model
            .initial_parameters(dimension)
            .check_same_shape(&self.state.parameters)?;
        check_dimension(dimension, validation, "validation")?;
        check_labels(self.model, training, "training")?;
        check_labels(self.model, validation, "validation")?;
        let signal_set = if validation.is_empty() { training } else { validation };

        info!(
            "training {} model on {} examples (dimension {}), {} parameters",
            self.model.name(),
            training.len(),
            dimension,
            self.state.parameters.len()
        );

        let mut stats = Vec::new();
        let mut history = Vec::new();

        let reason = loop {
            if self.config.keep_history {
                history.push(self.state.parameters.clone());
            }
            let previous = self.state.parameters.clone();
            let learning_rate = self.state.schedule.learning_rate();
            let momentum = self.state.schedule.momentum();
            let started = Instant::now();

            let update_ratio = self.run_epoch(training);
            self.state.epoch += 1;
            let epoch = self.state.epoch;

            let distance = self.model.distance(&previous, &self.state.parameters);
            let loss = match self.config.termination {
                Termination::DistanceBelow { .. } => None,
                _ => Some(self.model.loss(&self.state.parameters, signal_set)),
            };
            let signal = loss.unwrap_or(distance);

            let epoch_stats = EpochStats {
                epoch,
                loss,
                distance,
                learning_rate,
                momentum,
                update_ratio,
                elapsed_ms: started.elapsed().as_millis() as u64,
            };
            self.emit(TrainEvent::Epoch(epoch_stats.clone()));
            stats.push(epoch_stats);

            if !signal.is_finite() || !self.state.parameters.is_finite() {
                warn!("epoch {}: training diverged (signal {}); restoring previous parameters", epoch, signal);
                self.state.parameters = previous;
                self.state.momentum.reset();
                if self.tighten() == Tightening::Exhausted {
                    break TerminationReason::Exhausted;
                }
                if self.epoch_limit_reached() {
                    break TerminationReason::EpochLimit;
                }
                continue;
            }

            self.state.signal_history.push(signal);
            match loss {
                Some(loss) => info!(
                    "loss from epoch {}: {:.6} (distance {:.6}, lr {}, momentum {})",
                    epoch, loss, distance, learning_rate, momentum
                ),
                None => info!(
                    "distance from epoch {}: {:.6} (lr {}, momentum {})",
                    epoch, distance, learning_rate, momentum
                ),
            }

            if let Some(reason) = self.termination_reached(signal) {
                break reason;
            }

            let cancelled = self.hooks.stop.as_ref().is_some_and(|stop| stop.take());
            if cancelled {
                warn!("epoch {}: stop requested", epoch);
            }
            let stalled = insufficient_improvement(
                &self.state.signal_history,
                self.config.desired_decrease_ratio,
                self.config.min_history,
            );
            if (cancelled || stalled) && self.tighten() == Tightening::Exhausted {
                break TerminationReason::Exhausted;
            }
        };

        info!("training finished after {} epochs: {:?}", self.state.epoch, reason);
        self.emit(TrainEvent::Finished { reason, epochs: self.state.epoch });

        if self.config.keep_history {
            history.push(self.state.parameters.clone());
        }

        Ok(TrainReport {
            parameters: self.state.parameters,
            reason,
            epochs: self.state.epoch,
            signal_history: self.state.signal_history,
            stats,
            history,
        })
    }

    fn termination_reached(&self, signal: f64) -> Option<TerminationReason> {
        match self.config.termination {
            Termination::LossBelow { threshold } | Termination::DistanceBelow { threshold }
                if signal < threshold =>
            {
                Some(TerminationReason::Converged)
            }
            Termination::MaxEpochs { .. } if self.epoch_limit_reached() => Some(TerminationReason::EpochLimit),
            _ => None,
        }
    }

    fn epoch_limit_reached(&self) -> bool {
        matches!(self.config.termination, Termination::MaxEpochs { epochs } if self.state.epoch >= epochs)
    }

    fn tighten(&mut self) -> Tightening {
        let outcome = self.state.schedule.tighten();
        match outcome {
            Tightening::Tightened => info!(
                "decreasing learning rate to {} (momentum {})",
                self.state.schedule.learning_rate(),
                self.state.schedule.momentum()
            ),
            Tightening::Exhausted => info!(
                "learning rate {} fell below floor {}",
                self.state.schedule.learning_rate(),
                self.state.schedule.floor()
            ),
        }
        outcome
    }

    fn emit(&self, event: TrainEvent) {
        if let Some(tx) = &self.hooks.progress_tx {
            // Reporting never stops training; a closed channel is fine.
            let _ = tx.send(event);
        }
    }
}

/// Builds a [`Trainer`] for `training`'s dimension and runs it.
pub fn train<M: Model + ?Sized>(
    model: &M,
    training: &[Example],
    validation: &[Example],
    config: &TrainConfig,
    hooks: TrainHooks,
) -> Result<TrainReport> {
    let dimension = input_dimension(training, "training")?;
    Trainer::new(model, config, hooks, dimension)?.train(training, validation)
}
