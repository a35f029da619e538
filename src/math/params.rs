use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Ordered stack of bias-augmented weight layers.
///
/// Each layer is `(output units, input units + 1)`; column 0 carries the
/// bias. The same shape doubles as a gradient and as the momentum velocity,
/// so arithmetic here is layer-wise and requires matching shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub layers: Vec<Matrix>,
}

/// ∂Loss/∂Parameters for one minibatch.
pub type Gradient = Parameters;

/// Momentum accumulator.
pub type Velocity = Parameters;

impl Parameters {
    pub fn new(layers: Vec<Matrix>) -> Parameters {
        Parameters { layers }
    }

    /// All-zero value with the same layer shapes as `self`.
    pub fn zeros_like(&self) -> Parameters {
        Parameters {
            layers: self.layers.iter().map(|l| Matrix::zeros(l.rows, l.cols)).collect(),
        }
    }

    /// `(rows, cols)` per layer.
    pub fn shapes(&self) -> Vec<(usize, usize)> {
        self.layers.iter().map(|l| (l.rows, l.cols)).collect()
    }

    pub fn same_shape(&self, other: &Parameters) -> bool {
        self.layers.len() == other.layers.len()
            && self.layers.iter().zip(&other.layers).all(|(a, b)| a.same_shape(b))
    }

    pub fn check_same_shape(&self, other: &Parameters) -> Result<()> {
        if self.same_shape(other) {
            Ok(())
        } else {
            Err(Error::ShapeMismatch(format!(
                "parameter shapes differ: {:?} vs {:?}",
                self.shapes(),
                other.shapes()
            )))
        }
    }

    pub fn add(&self, other: &Parameters) -> Parameters {
        self.zip_layers(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Parameters) -> Parameters {
        self.zip_layers(other, |a, b| a - b)
    }

    pub fn scale(&self, factor: f64) -> Parameters {
        Parameters {
            layers: self.layers.iter().map(|l| l.scale(factor)).collect(),
        }
    }

    /// In-place `self += other`, accumulating left to right.
    pub fn accumulate(&mut self, other: &Parameters) {
        assert!(self.same_shape(other), "Matrices are of incorrect sizes");
        for (acc, layer) in self.layers.iter_mut().zip(&other.layers) {
            for (acc_row, row) in acc.data.iter_mut().zip(&layer.data) {
                for (a, x) in acc_row.iter_mut().zip(row) {
                    *a += x;
                }
            }
        }
    }

    /// Euclidean norm across every layer: sqrt of the summed squared
    /// per-layer Frobenius norms.
    pub fn norm(&self) -> f64 {
        self.layers.iter().map(Matrix::norm_squared).sum::<f64>().sqrt()
    }

    /// Norm of the elementwise difference.
    pub fn distance(&self, other: &Parameters) -> f64 {
        self.sub(other).norm()
    }

    pub fn is_finite(&self) -> bool {
        self.layers.iter().all(Matrix::is_finite)
    }

    /// Total number of scalar entries.
    pub fn len(&self) -> usize {
        self.layers.iter().map(|l| l.rows * l.cols).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serializes the parameters to a pretty-printed JSON file.
    pub fn save_json(&self, path: &std::path::Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes parameters written by `save_json`.
    pub fn load_json(path: &std::path::Path) -> Result<Parameters> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    fn zip_layers<F>(&self, other: &Parameters, f: F) -> Parameters
    where
        F: Fn(&Matrix, &Matrix) -> Matrix,
    {
        assert_eq!(self.layers.len(), other.layers.len(), "Matrices are of incorrect sizes");
        Parameters {
            layers: self.layers.iter().zip(&other.layers).map(|(a, b)| f(a, b)).collect(),
        }
    }
}
