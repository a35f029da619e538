use serde::{Serialize, Deserialize};

use crate::error::{Error, Result};

/// One labelled feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub datum: Vec<f64>,
    pub label: usize,
}

impl Example {
    pub fn new(datum: Vec<f64>, label: usize) -> Example {
        Example { datum, label }
    }

    pub fn dimension(&self) -> usize {
        self.datum.len()
    }
}

/// Datum length of the first example, or `EmptyDataset` when there is none.
pub fn input_dimension(examples: &[Example], which: &'static str) -> Result<usize> {
    examples
        .first()
        .map(Example::dimension)
        .ok_or(Error::EmptyDataset(which))
}

/// Compares the first example of `other` against `expected`.
///
/// Only the first record is sampled; per-record consistency is the loader's
/// responsibility.
pub fn check_dimension(expected: usize, other: &[Example], which: &str) -> Result<()> {
    match other.first() {
        Some(first) if first.dimension() != expected => Err(Error::ShapeMismatch(format!(
            "training data has dimension {} but {} data has dimension {}",
            expected,
            which,
            first.dimension()
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_of_empty_set_is_an_error() {
        assert!(matches!(input_dimension(&[], "training"), Err(Error::EmptyDataset("training"))));
    }

    #[test]
    fn mismatched_first_example_is_rejected() {
        let testing = vec![Example::new(vec![0.0; 5], 1)];
        let err = check_dimension(4, &testing, "testing").unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
        assert!(err.to_string().contains("testing data has dimension 5"));
    }

    #[test]
    fn empty_other_set_passes() {
        assert!(check_dimension(4, &[], "validation").is_ok());
    }
}
