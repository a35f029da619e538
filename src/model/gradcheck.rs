//! Finite-difference gradient checking for any [`Model`].
//!
//! The analytic gradient of one example is `example_gradient +
//! regularization_gradient`; it is compared against central differences of
//! `example_loss + regularization_loss`.

use crate::data::example::Example;
use crate::math::params::{Gradient, Parameters};
use crate::model::Model;

/// Perturbation size, 2⁻¹³.
pub const EPSILON: f64 = 1.0 / 8192.0;

/// Magnitudes below this are compared absolutely rather than relatively.
const RELATIVE_FLOOR: f64 = 1e-2;

pub fn total_example_loss<M: Model + ?Sized>(model: &M, parameters: &Parameters, example: &Example) -> f64 {
    model.example_loss(parameters, example) + model.regularization_loss(parameters)
}

pub fn analytic_gradient<M: Model + ?Sized>(model: &M, parameters: &Parameters, example: &Example) -> Gradient {
    model
        .example_gradient(parameters, example)
        .add(&model.regularization_gradient(parameters))
}

/// Central-difference approximation of the gradient, one entry at a time.
pub fn numerical_gradient<M: Model + ?Sized>(
    model: &M,
    parameters: &Parameters,
    example: &Example,
    epsilon: f64,
) -> Gradient {
    let mut probe = parameters.clone();
    let mut gradient = parameters.zeros_like();

    for l in 0..parameters.layers.len() {
        for i in 0..parameters.layers[l].rows {
            for j in 0..parameters.layers[l].cols {
                let original = probe.layers[l].data[i][j];

                probe.layers[l].data[i][j] = original + epsilon;
                let plus = total_example_loss(model, &probe, example);
                probe.layers[l].data[i][j] = original - epsilon;
                let minus = total_example_loss(model, &probe, example);
                probe.layers[l].data[i][j] = original;

                gradient.layers[l].data[i][j] = (plus - minus) / (2.0 * epsilon);
            }
        }
    }

    gradient
}

/// Largest entry-wise `|a - b| / max(|a|, |b|, floor)`.
pub fn max_relative_error(a: &Gradient, b: &Gradient) -> f64 {
    assert!(a.same_shape(b), "Matrices are of incorrect sizes");
    a.layers.iter()
        .zip(&b.layers)
        .flat_map(|(la, lb)| la.data.iter().flatten().zip(lb.data.iter().flatten()))
        .map(|(&x, &y)| (x - y).abs() / x.abs().max(y.abs()).max(RELATIVE_FLOOR))
        .fold(0.0, f64::max)
}

/// Relative error between the analytic and numerical gradients.
pub fn check_gradient<M: Model + ?Sized>(model: &M, parameters: &Parameters, example: &Example) -> f64 {
    let analytic = analytic_gradient(model, parameters, example);
    let numeric = numerical_gradient(model, parameters, example, EPSILON);
    max_relative_error(&analytic, &numeric)
}
