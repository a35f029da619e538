//! Renders the first layer's weight rows as square grayscale tiles, one per
//! output unit, so image-like inputs show what each unit responds to.

use std::path::PathBuf;

use image::GrayImage;

use crate::data::idx::{write_idx, IdxArray};
use crate::error::{Error, Result};
use crate::math::params::Parameters;
use crate::persist::ParameterSink;

/// First-layer weights without the bias column, each row min-max scaled to
/// `0..=255` and laid out as a `side × side` square.
///
/// The result has dimensions `(rows, side, side)`.
pub fn weight_squares(parameters: &Parameters) -> Result<IdxArray> {
    let layer = parameters
        .layers
        .first()
        .ok_or_else(|| Error::ShapeMismatch("parameters have no layers".into()))?;
    let weights = layer.cols.saturating_sub(1);
    let side = (weights as f64).sqrt().round() as usize;
    if weights == 0 || side * side != weights {
        return Err(Error::ShapeMismatch(format!(
            "{} weights per unit cannot be laid out as a square",
            weights
        )));
    }

    let mut data = Vec::with_capacity(layer.rows * weights);
    for row in &layer.data {
        let row = &row[1..];
        let min = row.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let span = max - min;
        data.extend(row.iter().map(|&w| {
            if span > 0.0 { ((w - min) / span * 255.0).round() as u8 } else { 0 }
        }));
    }

    Ok(IdxArray { dims: vec![layer.rows, side, side], data })
}

/// Writes the weight squares as one IDX3 file.
#[derive(Debug, Clone)]
pub struct IdxWeightSquares {
    pub path: PathBuf,
}

impl IdxWeightSquares {
    pub fn new(path: impl Into<PathBuf>) -> IdxWeightSquares {
        IdxWeightSquares { path: path.into() }
    }
}

impl ParameterSink for IdxWeightSquares {
    fn save(&mut self, parameters: &Parameters) -> Result<()> {
        let bytes = write_idx(&weight_squares(parameters)?)?;
        std::fs::write(&self.path, bytes)?;
        log::info!("saved weight squares to {}", self.path.display());
        Ok(())
    }
}

/// Writes each weight square as `unit-<i>.png` under `dir`.
#[derive(Debug, Clone)]
pub struct PngWeightSquares {
    pub dir: PathBuf,
}

impl PngWeightSquares {
    pub fn new(dir: impl Into<PathBuf>) -> PngWeightSquares {
        PngWeightSquares { dir: dir.into() }
    }
}

impl ParameterSink for PngWeightSquares {
    fn save(&mut self, parameters: &Parameters) -> Result<()> {
        let squares = weight_squares(parameters)?;
        let side = squares.dims[1];
        std::fs::create_dir_all(&self.dir)?;
        for (unit, pixels) in squares.data.chunks_exact(side * side).enumerate() {
            let img = GrayImage::from_raw(side as u32, side as u32, pixels.to_vec())
                .ok_or_else(|| Error::ShapeMismatch(format!("unit {} does not fill a {}x{} image", unit, side, side)))?;
            img.save(self.dir.join(format!("unit-{}.png", unit)))?;
        }
        log::info!("saved {} weight images to {}", squares.dims[0], self.dir.display());
        Ok(())
    }
}
