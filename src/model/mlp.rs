use rand::{rngs::StdRng, SeedableRng};

use crate::activation::activation::ActivationFunction;
use crate::data::example::Example;
use crate::math::matrix::Matrix;
use crate::math::params::{Gradient, Parameters};
use crate::model::regularization;
use crate::model::{argmax, one_hot, with_bias, Model};

/// Fully-connected stack: hidden layers apply `activation`, the output layer
/// is the identity, and the per-example loss is `0.5 * ‖output - onehot‖²`.
#[derive(Debug, Clone, PartialEq)]
pub struct MlpModel {
    /// Units per layer excluding the input layer; the last entry is the
    /// number of classes.
    pub layer_sizes: Vec<usize>,
    pub activation: ActivationFunction,
    pub regularization: f64,
    /// Seed for the initial weight draw.
    pub seed: u64,
}

/// Everything the backward pass needs from a forward pass.
struct ForwardPass {
    /// Bias-augmented input fed to each layer.
    inputs: Vec<Vec<f64>>,
    /// Activation derivative at each hidden layer's weighted sums.
    derivatives: Vec<Vec<f64>>,
    output: Vec<f64>,
}

impl MlpModel {
    /// # Panics
    /// Panics if `hidden_layers` is empty; an MLP has at least two layers.
    pub fn new(hidden_layers: &[usize], num_classes: usize, activation: ActivationFunction) -> MlpModel {
        assert!(!hidden_layers.is_empty(), "an MLP needs at least one hidden layer");
        let mut layer_sizes = hidden_layers.to_vec();
        layer_sizes.push(num_classes);
        MlpModel {
            layer_sizes,
            activation,
            regularization: regularization::DEFAULT_PENALTY,
            seed: 0,
        }
    }

    pub fn with_regularization(mut self, penalty: f64) -> MlpModel {
        self.regularization = penalty;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> MlpModel {
        self.seed = seed;
        self
    }

    fn forward(&self, parameters: &Parameters, datum: &[f64]) -> ForwardPass {
        let last = parameters.layers.len() - 1;
        let mut inputs = Vec::with_capacity(parameters.layers.len());
        let mut derivatives = Vec::with_capacity(last);
        let mut previous = datum.to_vec();

        for (index, layer) in parameters.layers.iter().enumerate() {
            let augmented = with_bias(&previous);
            let weighted_sums = layer.mul_vec(&augmented);
            inputs.push(augmented);
            if index < last {
                derivatives.push(weighted_sums.iter().map(|&z| self.activation.derivative(z)).collect());
                previous = weighted_sums.iter().map(|&z| self.activation.function(z)).collect();
            } else {
                previous = weighted_sums;
            }
        }

        ForwardPass { inputs, derivatives, output: previous }
    }

    /// Output-layer activations (identity of the final weighted sums).
    pub fn outputs(&self, parameters: &Parameters, datum: &[f64]) -> Vec<f64> {
        self.forward(parameters, datum).output
    }
}

impl Model for MlpModel {
    fn name(&self) -> &str {
        "mlp"
    }

    fn num_classes(&self) -> usize {
        self.layer_sizes.last().copied().unwrap_or(0)
    }

    fn initial_parameters(&self, input_dimension: usize) -> Parameters {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut fan_in = input_dimension;
        let layers = self.layer_sizes.iter()
            .map(|&size| {
                let layer = Matrix::fan_in_normal(size, fan_in, &mut rng);
                fan_in = size;
                layer
            })
            .collect();
        Parameters::new(layers)
    }

    fn example_gradient(&self, parameters: &Parameters, example: &Example) -> Gradient {
        let pass = self.forward(parameters, &example.datum);
        let target = one_hot(example.label, self.num_classes());

        // Identity output with squared loss: the output unit-input partial is
        // simply output - target.
        let mut delta: Vec<f64> = pass.output.iter().zip(&target).map(|(o, t)| o - t).collect();

        let mut layers = vec![Matrix::default(); parameters.layers.len()];
        for index in (0..parameters.layers.len()).rev() {
            layers[index] = Matrix::outer(&delta, &pass.inputs[index]);
            if index > 0 {
                // The bias input has no upstream unit, so its entry is dropped.
                let sums = parameters.layers[index].transpose_mul_vec(&delta);
                delta = hadamard(&sums[1..], &pass.derivatives[index - 1]);
            }
        }
        Parameters::new(layers)
    }

    fn example_loss(&self, parameters: &Parameters, example: &Example) -> f64 {
        let output = self.outputs(parameters, &example.datum);
        let target = one_hot(example.label, self.num_classes());
        0.5 * output.iter().zip(&target).map(|(o, t)| (o - t).powi(2)).sum::<f64>()
    }

    fn regularization_gradient(&self, parameters: &Parameters) -> Gradient {
        regularization::gradient(parameters, self.regularization)
    }

    fn regularization_loss(&self, parameters: &Parameters) -> f64 {
        regularization::loss(parameters, self.regularization)
    }

    fn predict(&self, parameters: &Parameters, datum: &[f64]) -> usize {
        argmax(&self.outputs(parameters, datum))
    }
}

/// Element-wise (Hadamard) product of two same-length vectors.
fn hadamard(a: &[f64], b: &[f64]) -> Vec<f64> {
    assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn layer_shapes_chain_through_bias_columns() {
        let model = MlpModel::new(&[5, 4], 3, ActivationFunction::Tanh);
        let params = model.initial_parameters(7);
        assert_eq!(params.shapes(), vec![(5, 8), (4, 6), (3, 5)]);
    }

    #[test]
    #[should_panic(expected = "at least one hidden layer")]
    fn hidden_layers_are_required() {
        MlpModel::new(&[], 2, ActivationFunction::Tanh);
    }

    #[test]
    fn initialization_is_deterministic_per_seed() {
        let model = MlpModel::new(&[6], 2, ActivationFunction::Tanh).with_seed(11);
        assert_eq!(model.initial_parameters(3), model.initial_parameters(3));
        let other = model.clone().with_seed(12);
        assert_ne!(model.initial_parameters(3), other.initial_parameters(3));
    }

    #[test]
    fn output_layer_is_linear() {
        let model = MlpModel::new(&[1], 2, ActivationFunction::Tanh);
        let params = Parameters::new(vec![
            Matrix::from_data(vec![vec![0.0, 1.0]]),
            Matrix::from_data(vec![vec![0.5, 2.0], vec![-1.0, 0.0]]),
        ]);
        let out = model.outputs(&params, &[0.3]);
        assert_abs_diff_eq!(out[0], 0.5 + 2.0 * 0.3_f64.tanh(), epsilon = 1e-12);
        assert_abs_diff_eq!(out[1], -1.0, epsilon = 1e-12);
        assert_eq!(model.predict(&params, &[0.3]), 0);
    }

    #[test]
    fn output_gradient_is_delta_times_hidden_activations() {
        let model = MlpModel::new(&[1], 2, ActivationFunction::Tanh);
        let params = Parameters::new(vec![
            Matrix::from_data(vec![vec![0.0, 1.0]]),
            Matrix::from_data(vec![vec![0.0, 1.0], vec![0.0, 0.0]]),
        ]);
        let grad = model.example_gradient(&params, &Example::new(vec![0.5], 1));
        let h = 0.5_f64.tanh();
        // output = (h, 0), target = (0, 1)
        assert_abs_diff_eq!(grad.layers[1].data[0][0], h, epsilon = 1e-12);
        assert_abs_diff_eq!(grad.layers[1].data[0][1], h * h, epsilon = 1e-12);
        assert_abs_diff_eq!(grad.layers[1].data[1][1], -h, epsilon = 1e-12);
        // hidden delta = w * delta_out * (1 - h²)
        let hidden_delta = h * (1.0 - h * h);
        assert_abs_diff_eq!(grad.layers[0].data[0][0], hidden_delta, epsilon = 1e-12);
        assert_abs_diff_eq!(grad.layers[0].data[0][1], hidden_delta * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn loss_is_half_squared_error() {
        let model = MlpModel::new(&[1], 2, ActivationFunction::Tanh).with_regularization(0.0);
        let params = Parameters::new(vec![
            Matrix::zeros(1, 2),
            Matrix::from_data(vec![vec![2.0, 0.0], vec![0.0, 0.0]]),
        ]);
        // output = (2, 0), target = (0, 1)
        let loss = model.loss(&params, &[Example::new(vec![9.0], 1)]);
        assert_abs_diff_eq!(loss, 0.5 * (4.0 + 1.0), epsilon = 1e-12);
    }
}
