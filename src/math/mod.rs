pub mod matrix;
pub mod params;

pub use matrix::Matrix;
pub use params::{Gradient, Parameters, Velocity};
