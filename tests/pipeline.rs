use std::path::{Path, PathBuf};

use descent_nn::data::{read_idx, write_idx, IdxArray};
use descent_nn::persist::{IdxWeightSquares, PngWeightSquares};
use descent_nn::{
    load_examples, run, Datasets, Error, JsonSnapshot, Parameters, SinkFanout, SoftmaxModel, TrainConfig,
    TrainHooks,
};

const TOP: [u8; 16] = [255, 255, 255, 255, 255, 255, 255, 255, 0, 0, 0, 0, 0, 0, 0, 0];
const BOTTOM: [u8; 16] = [0, 0, 0, 0, 0, 0, 0, 0, 255, 255, 255, 255, 255, 255, 255, 255];

/// Eight 4x4 images: bright top half is class 0, bright bottom half class 1.
fn write_dataset(dir: &Path, name: &str) -> (PathBuf, PathBuf) {
    let mut pixels = Vec::new();
    let mut labels = Vec::new();
    for _ in 0..4 {
        pixels.extend_from_slice(&TOP);
        labels.push(0);
        pixels.extend_from_slice(&BOTTOM);
        labels.push(1);
    }

    let images_path = dir.join(format!("{}-images.idx3-ubyte", name));
    let labels_path = dir.join(format!("{}-labels.idx1-ubyte", name));
    let images = IdxArray { dims: vec![8, 4, 4], data: pixels };
    let labels = IdxArray { dims: vec![8], data: labels };
    std::fs::write(&images_path, write_idx(&images).unwrap()).unwrap();
    std::fs::write(&labels_path, write_idx(&labels).unwrap()).unwrap();
    (images_path, labels_path)
}

#[test]
fn idx_files_train_evaluate_and_persist() {
    let dir = tempfile::tempdir().unwrap();
    let (train_images, train_labels) = write_dataset(dir.path(), "train");
    let (test_images, test_labels) = write_dataset(dir.path(), "test");

    let datasets = Datasets {
        training: load_examples(&train_images, &train_labels).unwrap(),
        validation: Vec::new(),
        testing: load_examples(&test_images, &test_labels).unwrap(),
    };
    assert_eq!(datasets.training.len(), 8);
    assert_eq!(datasets.training[0].dimension(), 16);

    let out = dir.path().join("out");
    std::fs::create_dir_all(&out).unwrap();
    let mut sinks = SinkFanout::new()
        .with(JsonSnapshot::new(out.join("parameters.json")))
        .with(IdxWeightSquares::new(out.join("weights.idx3-ubyte")))
        .with(PngWeightSquares::new(out.join("weights")));

    let report = run(&SoftmaxModel::new(2), &datasets, &TrainConfig::default(), TrainHooks::new(), &mut sinks)
        .unwrap();

    assert_eq!(report.evaluation.error_rate, 0.0);
    assert_eq!(report.evaluation.total, 8);

    let saved = Parameters::load_json(&out.join("parameters.json")).unwrap();
    assert_eq!(saved, report.train.parameters);

    let squares = read_idx(&std::fs::read(out.join("weights.idx3-ubyte")).unwrap()).unwrap();
    assert_eq!(squares.dims, vec![2, 4, 4]);
    assert!(out.join("weights").join("unit-0.png").exists());
    assert!(out.join("weights").join("unit-1.png").exists());
}

#[test]
fn mismatched_label_count_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let (images, _) = write_dataset(dir.path(), "train");
    let labels = dir.path().join("short-labels.idx1-ubyte");
    std::fs::write(&labels, write_idx(&IdxArray { dims: vec![3], data: vec![0, 1, 0] }).unwrap()).unwrap();

    assert!(matches!(load_examples(&images, &labels), Err(Error::ShapeMismatch(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent");
    assert!(matches!(load_examples(&missing, &missing), Err(Error::Io(_))));
}
