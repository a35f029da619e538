//! IDX codec for the byte-matrix files used by MNIST-style datasets.
//!
//! # Layout
//! ```text
//! bytes  0-1:   0x00 0x00   (reserved, must be zero)
//! byte   2:     0x08        (dtype = uint8)
//! byte   3:     rank        (number of dimensions)
//! bytes  4..:   rank big-endian u32 dimension sizes
//! then:         product(dimensions) bytes, row-major
//! ```
//!
//! Feature files are rank 3 `(count, rows, cols)`; label files are rank 1
//! `(count)`.
use std::path::Path;

use crate::data::example::Example;
use crate::error::{Error, Result};

const DTYPE_U8: u8 = 0x08;

/// A decoded n-dimensional `u8` array.
#[derive(Debug, Clone, PartialEq)]
pub struct IdxArray {
    pub dims: Vec<usize>,
    pub data: Vec<u8>,
}

impl IdxArray {
    /// Number of bytes in one record along the first dimension.
    pub fn record_len(&self) -> usize {
        self.dims.iter().skip(1).product()
    }
}

/// Decodes an IDX buffer of unsigned bytes.
pub fn read_idx(bytes: &[u8]) -> Result<IdxArray> {
    if bytes.len() < 4 {
        return Err(Error::MalformedDataset(format!(
            "IDX file too short: expected at least 4 header bytes, got {}.",
            bytes.len()
        )));
    }
    if bytes[0] != 0x00 || bytes[1] != 0x00 {
        return Err(Error::MalformedDataset(format!(
            "IDX file: bytes 0-1 must be 0x00 0x00 (reserved), got 0x{:02X} 0x{:02X}.",
            bytes[0], bytes[1]
        )));
    }
    if bytes[2] != DTYPE_U8 {
        return Err(Error::MalformedDataset(format!(
            "IDX file: byte 2 (dtype) must be 0x08 (uint8), got 0x{:02X}.",
            bytes[2]
        )));
    }

    let rank = bytes[3] as usize;
    let header_len = 4 + 4 * rank;
    if bytes.len() < header_len {
        return Err(Error::MalformedDataset(format!(
            "IDX file too short: rank {} needs {} header bytes, got {}.",
            rank, header_len, bytes.len()
        )));
    }

    let dims: Vec<usize> = bytes[4..header_len]
        .chunks_exact(4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as usize)
        .collect();

    let payload_len = dims
        .iter()
        .try_fold(1_usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| Error::MalformedDataset(format!(
            "IDX file: dimensions {:?} overflow usize.",
            dims
        )))?;

    let payload = &bytes[header_len..];
    if payload.len() < payload_len {
        return Err(Error::MalformedDataset(format!(
            "IDX file too short: header declares dimensions {:?} ({} data bytes) \
             but only {} bytes follow the header.",
            dims, payload_len, payload.len()
        )));
    }

    Ok(IdxArray { dims, data: payload[..payload_len].to_vec() })
}

/// Encodes an n-dimensional `u8` array.
pub fn write_idx(array: &IdxArray) -> Result<Vec<u8>> {
    let expected: usize = array.dims.iter().product();
    if expected != array.data.len() {
        return Err(Error::ShapeMismatch(format!(
            "IDX dimensions {:?} need {} bytes, got {}",
            array.dims, expected, array.data.len()
        )));
    }
    if array.dims.len() > u8::MAX as usize {
        return Err(Error::ShapeMismatch(format!("IDX rank {} exceeds 255", array.dims.len())));
    }

    let mut out = Vec::with_capacity(4 + 4 * array.dims.len() + array.data.len());
    out.extend_from_slice(&[0x00, 0x00, DTYPE_U8, array.dims.len() as u8]);
    for &d in &array.dims {
        let d = u32::try_from(d)
            .map_err(|_| Error::ShapeMismatch(format!("IDX dimension {} exceeds u32", d)))?;
        out.extend_from_slice(&d.to_be_bytes());
    }
    out.extend_from_slice(&array.data);
    Ok(out)
}

/// Pixel scaling into roughly `[-0.5, 0.5)`.
fn scale_pixel(px: u8) -> f64 {
    px as f64 / 256.0 - 0.5
}

/// Pairs a rank-3 feature file with a rank-1 label file.
pub fn parse_examples(image_bytes: &[u8], label_bytes: &[u8]) -> Result<Vec<Example>> {
    let images = read_idx(image_bytes)?;
    if images.dims.len() != 3 {
        return Err(Error::MalformedDataset(format!(
            "IDX image file: expected 3 dimensions, got {}.",
            images.dims.len()
        )));
    }
    let labels = read_idx(label_bytes)?;
    if labels.dims.len() != 1 {
        return Err(Error::MalformedDataset(format!(
            "IDX label file: expected 1 dimension, got {}.",
            labels.dims.len()
        )));
    }

    let n_items = images.dims[0];
    if labels.dims[0] != n_items {
        return Err(Error::ShapeMismatch(format!(
            "number of data ({}) and number of labels ({}) do not match",
            n_items, labels.dims[0]
        )));
    }

    let record_len = images.record_len();
    if record_len == 0 {
        return Err(Error::MalformedDataset("IDX image file: records have zero pixels.".to_owned()));
    }

    let examples = images
        .data
        .chunks_exact(record_len)
        .zip(labels.data.iter())
        .map(|(pixels, &label)| Example::new(
            pixels.iter().map(|&px| scale_pixel(px)).collect(),
            label as usize,
        ))
        .collect();
    Ok(examples)
}

/// Reads and pairs an image file and a label file from disk.
pub fn load_examples(images_path: &Path, labels_path: &Path) -> Result<Vec<Example>> {
    let image_bytes = std::fs::read(images_path)?;
    let label_bytes = std::fs::read(labels_path)?;
    let examples = parse_examples(&image_bytes, &label_bytes)?;
    log::info!(
        "loaded {} examples from {} / {}",
        examples.len(),
        images_path.display(),
        labels_path.display()
    );
    Ok(examples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn images(n: usize, rows: usize, cols: usize) -> Vec<u8> {
        let data = (0..n * rows * cols).map(|i| (i % 256) as u8).collect();
        write_idx(&IdxArray { dims: vec![n, rows, cols], data }).unwrap()
    }

    fn labels(values: &[u8]) -> Vec<u8> {
        write_idx(&IdxArray { dims: vec![values.len()], data: values.to_vec() }).unwrap()
    }

    #[test]
    fn pairs_images_with_labels() {
        let examples = parse_examples(&images(3, 2, 2), &labels(&[7, 0, 3])).unwrap();
        assert_eq!(examples.len(), 3);
        assert_eq!(examples[2].label, 3);
        assert_eq!(examples[0].dimension(), 4);
        assert_abs_diff_eq!(examples[0].datum[0], -0.5);
        assert_abs_diff_eq!(examples[0].datum[1], 1.0 / 256.0 - 0.5);
    }

    #[test]
    fn count_mismatch_is_a_shape_error() {
        let err = parse_examples(&images(3, 2, 2), &labels(&[1, 2])).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch(_)));
    }

    #[test]
    fn rejects_bad_reserved_bytes() {
        let mut bytes = labels(&[1]);
        bytes[1] = 0x01;
        assert!(matches!(read_idx(&bytes), Err(Error::MalformedDataset(_))));
    }

    #[test]
    fn rejects_non_byte_dtype() {
        let mut bytes = labels(&[1]);
        bytes[2] = 0x0D;
        assert!(matches!(read_idx(&bytes), Err(Error::MalformedDataset(_))));
    }

    #[test]
    fn rejects_wrong_rank_for_images() {
        let err = parse_examples(&labels(&[1, 2]), &labels(&[1, 2])).unwrap_err();
        assert!(matches!(err, Error::MalformedDataset(_)));
    }

    #[test]
    fn rejects_truncated_payload() {
        let mut bytes = images(2, 3, 3);
        bytes.truncate(bytes.len() - 1);
        assert!(matches!(read_idx(&bytes), Err(Error::MalformedDataset(_))));
    }

    #[test]
    fn write_checks_payload_length() {
        let array = IdxArray { dims: vec![2, 2], data: vec![0; 3] };
        assert!(matches!(write_idx(&array), Err(Error::ShapeMismatch(_))));
    }

    #[test]
    fn reads_back_what_it_writes() {
        let array = IdxArray { dims: vec![2, 1, 3], data: vec![1, 2, 3, 4, 5, 6] };
        assert_eq!(read_idx(&write_idx(&array).unwrap()).unwrap(), array);
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("train-images");
        let lbl = dir.path().join("train-labels");
        std::fs::write(&img, images(4, 2, 3)).unwrap();
        std::fs::write(&lbl, labels(&[0, 1, 0, 1])).unwrap();
        let examples = load_examples(&img, &lbl).unwrap();
        assert_eq!(examples.len(), 4);
        assert!(examples.iter().all(|e| e.dimension() == 6));
    }
}
