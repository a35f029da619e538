//! L2 weight penalty that leaves the bias column (column 0) alone.

use crate::math::matrix::Matrix;
use crate::math::params::{Gradient, Parameters};

pub const DEFAULT_PENALTY: f64 = 0.01;

/// `2λW` with column 0 zeroed.
pub fn layer_gradient(layer: &Matrix, penalty: f64) -> Matrix {
    let mut grad = layer.scale(2.0 * penalty);
    for row in &mut grad.data {
        if let Some(bias) = row.first_mut() {
            *bias = 0.0;
        }
    }
    grad
}

/// `λ‖W‖²` over every column except column 0.
pub fn layer_loss(layer: &Matrix, penalty: f64) -> f64 {
    let sum: f64 = layer.data.iter()
        .flat_map(|row| row.iter().skip(1))
        .map(|w| w * w)
        .sum();
    penalty * sum
}

pub fn gradient(parameters: &Parameters, penalty: f64) -> Gradient {
    Parameters::new(parameters.layers.iter().map(|l| layer_gradient(l, penalty)).collect())
}

pub fn loss(parameters: &Parameters, penalty: f64) -> f64 {
    parameters.layers.iter().map(|l| layer_loss(l, penalty)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn bias_column_is_exactly_zero(
            rows in prop::collection::vec(prop::collection::vec(-10.0f64..10.0, 4), 1..6),
            penalty in 0.0f64..1.0,
        ) {
            let layer = Matrix::from_data(rows);
            let grad = layer_gradient(&layer, penalty);
            for (g_row, w_row) in grad.data.iter().zip(&layer.data) {
                prop_assert_eq!(g_row[0], 0.0);
                for j in 1..w_row.len() {
                    prop_assert_eq!(g_row[j], 2.0 * penalty * w_row[j]);
                }
            }
        }
    }

    #[test]
    fn loss_skips_bias() {
        let layer = Matrix::from_data(vec![vec![100.0, 1.0, 2.0], vec![-100.0, 0.0, 3.0]]);
        assert_abs_diff_eq!(layer_loss(&layer, 0.5), 0.5 * 14.0, epsilon = 1e-12);
    }

    #[test]
    fn loss_sums_over_layers() {
        let params = Parameters::new(vec![
            Matrix::from_data(vec![vec![0.0, 1.0]]),
            Matrix::from_data(vec![vec![0.0, 2.0]]),
        ]);
        assert_abs_diff_eq!(loss(&params, 0.01), 0.05, epsilon = 1e-12);
    }
}
