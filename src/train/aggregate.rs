use crate::data::example::Example;
use crate::math::params::Gradient;
use crate::math::params::Parameters;
use crate::model::Model;

/// Averaged per-example gradient of a minibatch plus one regularization
/// gradient.
///
/// Example gradients are summed left to right in minibatch order.
///
/// # Panics
/// Panics on an empty minibatch.
pub fn aggregate<M: Model + ?Sized>(model: &M, parameters: &Parameters, minibatch: &[&Example]) -> Gradient {
    assert!(!minibatch.is_empty(), "cannot aggregate an empty minibatch");

    let mut total = model.example_gradient(parameters, minibatch[0]);
    for example in &minibatch[1..] {
        total.accumulate(&model.example_gradient(parameters, example));
    }

    total
        .scale(1.0 / minibatch.len() as f64)
        .add(&model.regularization_gradient(parameters))
}
