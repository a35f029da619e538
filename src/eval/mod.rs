pub mod evaluator;

pub use evaluator::{evaluate, Evaluation, Misprediction};
