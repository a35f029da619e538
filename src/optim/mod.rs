pub mod momentum;
pub mod schedule;

pub use momentum::Momentum;
pub use schedule::{insufficient_improvement, MomentumRule, Schedule, Tightening, MAX_DECREASES_LIMIT};
