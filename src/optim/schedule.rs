use serde::{Serialize, Deserialize};

/// How momentum moves when the schedule tightens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumRule {
    /// `m / 2 + 0.5`: halfway to 1.
    Halfway,
    /// Jump straight to the given value (never lowering the current one).
    Fixed(f64),
}

impl MomentumRule {
    /// Momentum after one tightening. Never lower than `momentum` and never
    /// 1.0 or more; a step that would round up to 1.0 leaves it unchanged.
    pub fn next(&self, momentum: f64) -> f64 {
        let proposed = match self {
            MomentumRule::Halfway => momentum / 2.0 + 0.5,
            MomentumRule::Fixed(value) => *value,
        };
        if proposed < 1.0 {
            proposed.max(momentum)
        } else {
            momentum
        }
    }
}

/// Largest accepted `max_decreases`.
pub const MAX_DECREASES_LIMIT: u32 = 32;

/// Result of one tightening step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tightening {
    Tightened,
    /// The learning rate fell below its floor; training should stop.
    Exhausted,
}

/// Learning rate and momentum for one training run.
///
/// Only [`Schedule::tighten`] changes them: the learning rate is divided by
/// `decrease_factor` and momentum pushed toward 1. Once more than
/// `max_decreases` tightenings have happened the learning rate is below
/// `initial / decrease_factor^max_decreases` and the schedule is exhausted.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    initial_learning_rate: f64,
    learning_rate: f64,
    momentum: f64,
    decrease_factor: f64,
    max_decreases: u32,
    decreases: u32,
    rule: MomentumRule,
}

impl Schedule {
    pub fn new(
        initial_learning_rate: f64,
        initial_momentum: f64,
        decrease_factor: f64,
        max_decreases: u32,
        rule: MomentumRule,
    ) -> Schedule {
        Schedule {
            initial_learning_rate,
            learning_rate: initial_learning_rate,
            momentum: initial_momentum,
            decrease_factor,
            max_decreases,
            decreases: 0,
            rule,
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn decreases(&self) -> u32 {
        self.decreases
    }

    pub fn floor(&self) -> f64 {
        self.initial_learning_rate / self.decrease_factor.powf(self.max_decreases as f64)
    }

    pub fn tighten(&mut self) -> Tightening {
        self.learning_rate /= self.decrease_factor;
        self.momentum = self.rule.next(self.momentum);
        self.decreases += 1;
        if self.decreases > self.max_decreases {
            Tightening::Exhausted
        } else {
            Tightening::Tightened
        }
    }
}

/// True when the latest signal did not drop by at least `desired_ratio`
/// relative to the one before it (`previous / current < desired_ratio`).
///
/// Nothing is judged until `min_history` signals are recorded. A NaN ratio
/// counts as insufficient.
pub fn insufficient_improvement(history: &[f64], desired_ratio: f64, min_history: usize) -> bool {
    let n = history.len();
    if n < min_history.max(2) {
        return false;
    }
    let ratio = history[n - 2] / history[n - 1];
    !(ratio >= desired_ratio)
}
