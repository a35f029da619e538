use crate::data::example::Example;
use crate::math::matrix::Matrix;
use crate::math::params::{Gradient, Parameters};
use crate::model::regularization;
use crate::model::{argmax, one_hot, with_bias, Model};

/// Multinomial logistic regression: one `(classes, 1 + d)` layer whose
/// exponentiated, normalized outputs are class probabilities.
///
/// Per-example loss is the negative log-probability of the true label;
/// parameters start at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct SoftmaxModel {
    pub num_classes: usize,
    pub regularization: f64,
}

impl SoftmaxModel {
    pub fn new(num_classes: usize) -> SoftmaxModel {
        SoftmaxModel { num_classes, regularization: regularization::DEFAULT_PENALTY }
    }

    pub fn with_regularization(mut self, penalty: f64) -> SoftmaxModel {
        self.regularization = penalty;
        self
    }

    fn layer<'a>(&self, parameters: &'a Parameters) -> &'a Matrix {
        assert_eq!(parameters.layers.len(), 1, "softmax parameters have exactly one layer");
        &parameters.layers[0]
    }

    /// Class probabilities for a bias-augmented datum.
    ///
    /// Logits are shifted by their maximum before exponentiation so large
    /// weights cannot overflow.
    pub fn probabilities(&self, parameters: &Parameters, augmented: &[f64]) -> Vec<f64> {
        let logits = self.layer(parameters).mul_vec(augmented);
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|z| (z - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }
}

impl Model for SoftmaxModel {
    fn name(&self) -> &str {
        "softmax"
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn initial_parameters(&self, input_dimension: usize) -> Parameters {
        Parameters::new(vec![Matrix::zeros(self.num_classes, input_dimension + 1)])
    }

    /// `(p - onehot(label)) ⊗ [1, x]`.
    fn example_gradient(&self, parameters: &Parameters, example: &Example) -> Gradient {
        let augmented = with_bias(&example.datum);
        let target = one_hot(example.label, self.num_classes);
        let errors: Vec<f64> = self.probabilities(parameters, &augmented)
            .iter()
            .zip(&target)
            .map(|(p, t)| p - t)
            .collect();
        Parameters::new(vec![Matrix::outer(&errors, &augmented)])
    }

    fn example_loss(&self, parameters: &Parameters, example: &Example) -> f64 {
        let augmented = with_bias(&example.datum);
        let logits = self.layer(parameters).mul_vec(&augmented);
        let max = logits.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let log_total = logits.iter().map(|z| (z - max).exp()).sum::<f64>().ln() + max;
        log_total - logits[example.label]
    }

    fn regularization_gradient(&self, parameters: &Parameters) -> Gradient {
        regularization::gradient(parameters, self.regularization)
    }

    fn regularization_loss(&self, parameters: &Parameters) -> f64 {
        regularization::loss(parameters, self.regularization)
    }

    fn predict(&self, parameters: &Parameters, datum: &[f64]) -> usize {
        argmax(&self.layer(parameters).mul_vec(&with_bias(datum)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn zero_parameters_give_uniform_probabilities() {
        let model = SoftmaxModel::new(4);
        let params = model.initial_parameters(3);
        let p = model.probabilities(&params, &with_bias(&[0.2, -0.1, 0.9]));
        for pi in p {
            assert_abs_diff_eq!(pi, 0.25, epsilon = 1e-12);
        }
        let loss = model.example_loss(&params, &Example::new(vec![0.2, -0.1, 0.9], 2));
        assert_abs_diff_eq!(loss, 4.0_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn gradient_rows_follow_probability_errors() {
        let model = SoftmaxModel::new(2);
        let params = model.initial_parameters(1);
        let grad = model.example_gradient(&params, &Example::new(vec![2.0], 1));
        // p = (0.5, 0.5), target = (0, 1), input = [1, 2]
        assert_eq!(grad.layers[0].data, vec![vec![0.5, 1.0], vec![-0.5, -1.0]]);
    }

    #[test]
    fn large_logits_do_not_overflow() {
        let model = SoftmaxModel::new(2);
        let params = Parameters::new(vec![Matrix::from_data(vec![vec![0.0, 1000.0], vec![0.0, -1000.0]])]);
        let loss = model.example_loss(&params, &Example::new(vec![1.0], 0));
        assert!(loss.is_finite());
        assert_abs_diff_eq!(loss, 0.0, epsilon = 1e-12);
        assert_eq!(model.predict(&params, &[1.0]), 0);
        assert_eq!(model.predict(&params, &[-1.0]), 1);
    }

    #[test]
    fn loss_adds_regularization_once() {
        let model = SoftmaxModel::new(2).with_regularization(0.5);
        let params = Parameters::new(vec![Matrix::from_data(vec![vec![3.0, 1.0], vec![0.0, 0.0]])]);
        let examples = vec![Example::new(vec![0.0], 0), Example::new(vec![0.0], 0)];
        let mean = model.example_loss(&params, &examples[0]);
        assert_abs_diff_eq!(model.loss(&params, &examples), mean + 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(model.loss(&params, &[]), 0.5, epsilon = 1e-12);
    }
}
