//! Small classifiers trained by minibatch gradient descent with momentum.
//!
//! A [`Model`] (softmax regression or a tanh MLP) supplies gradients and
//! losses; the [`Trainer`] partitions the training set into minibatches,
//! averages their gradients, takes momentum steps, and after each epoch
//! either terminates or tightens its learning-rate/momentum schedule.
//! [`evaluate`] reports the error rate on held-out data and a
//! [`ParameterSink`] receives the final parameters.

pub mod activation;
pub mod data;
pub mod error;
pub mod eval;
pub mod math;
pub mod model;
pub mod optim;
pub mod persist;
pub mod run;
pub mod train;

// Convenience re-exports
pub use activation::ActivationFunction;
pub use data::{load_examples, Example};
pub use error::{Error, Result};
pub use eval::{evaluate, Evaluation, Misprediction};
pub use math::{Gradient, Matrix, Parameters, Velocity};
pub use model::{Model, MlpModel, ModelSpec, SoftmaxModel, UpdateSign};
pub use optim::{Momentum, MomentumRule, Schedule};
pub use persist::{JsonSnapshot, ParameterSink, SinkFanout};
pub use run::{run, Datasets, RunReport};
pub use train::{
    train, EpochStats, StopSignal, Termination, TerminationReason, TrainConfig, TrainEvent, TrainHooks,
    TrainReport, Trainer,
};
