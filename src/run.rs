use log::info;

use crate::data::example::{check_dimension, input_dimension, Example};
use crate::error::Result;
use crate::eval::evaluator::{evaluate, Evaluation};
use crate::model::{check_labels, Model};
use crate::persist::ParameterSink;
use crate::train::train_config::{TrainConfig, TrainHooks};
use crate::train::trainer::{TrainReport, Trainer};

/// Training, optional validation, and testing examples for one run.
#[derive(Debug, Clone, Default)]
pub struct Datasets {
    pub training: Vec<Example>,
    /// Loss-signal set; the training set is used when this is empty.
    pub validation: Vec<Example>,
    pub testing: Vec<Example>,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub train: TrainReport,
    pub evaluation: Evaluation,
}

/// Trains `model`, evaluates it on the testing set, and hands the final
/// parameters to `sink` once.
///
/// Dimension and label checks across all three sets happen before any epoch
/// runs.
pub fn run<M: Model + ?Sized>(
    model: &M,
    datasets: &Datasets,
    config: &TrainConfig,
    hooks: TrainHooks,
    sink: &mut dyn ParameterSink,
) -> Result<RunReport> {
    let dimension = input_dimension(&datasets.training, "training")?;
    check_dimension(dimension, &datasets.validation, "validation")?;
    check_dimension(dimension, &datasets.testing, "testing")?;
    check_labels(model, &datasets.testing, "testing")?;

    let train = Trainer::new(model, config, hooks, dimension)?
        .train(&datasets.training, &datasets.validation)?;

    let evaluation = evaluate(model, &train.parameters, &datasets.testing, dimension)?;
    info!(
        "error rate (%): {:.2} ({} of {} misclassified)",
        evaluation.error_percent(),
        evaluation.mispredictions.len(),
        evaluation.total
    );

    sink.save(&train.parameters)?;

    Ok(RunReport { train, evaluation })
}
