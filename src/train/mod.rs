pub mod aggregate;
pub mod epoch_stats;
pub mod partition;
pub mod stop;
pub mod train_config;
pub mod trainer;

pub use aggregate::aggregate;
pub use epoch_stats::{EpochStats, TerminationReason, TrainEvent};
pub use partition::{partition, Minibatches, ProgressCadence};
pub use stop::StopSignal;
pub use train_config::{Termination, TrainConfig, TrainHooks};
pub use trainer::{train, OptimizerState, TrainReport, Trainer};
