//! descent-nn CLI
//!
//! Trains a classifier on IDX image/label files and evaluates it.
//!
//! ```bash
//! descent-nn --train-images train-images-idx3-ubyte --train-labels train-labels-idx1-ubyte \
//!            --test-images t10k-images-idx3-ubyte --test-labels t10k-labels-idx1-ubyte \
//!            --model mlp.json --config train.json --out-dir out --interactive
//! ```
//!
//! With `--interactive`, each Enter keypress asks the trainer to tighten its
//! schedule at the next epoch boundary.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use clap::Parser;
use log::{info, warn};

use descent_nn::data::load_examples;
use descent_nn::persist::{IdxWeightSquares, PngWeightSquares};
use descent_nn::{
    run, Datasets, JsonSnapshot, ModelSpec, SinkFanout, StopSignal, TrainConfig, TrainEvent, TrainHooks,
};

#[derive(Parser, Debug)]
#[command(name = "descent-nn", version, about = "Train and evaluate a small classifier on IDX data")]
struct Cli {
    #[arg(long)]
    train_images: PathBuf,
    #[arg(long)]
    train_labels: PathBuf,

    #[arg(long, requires = "validation_labels")]
    validation_images: Option<PathBuf>,
    #[arg(long, requires = "validation_images")]
    validation_labels: Option<PathBuf>,

    #[arg(long)]
    test_images: PathBuf,
    #[arg(long)]
    test_labels: PathBuf,

    /// Training hyperparameters (JSON); defaults apply to missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Model choice (JSON); softmax over 10 classes when omitted.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Directory for parameters, weight images and mispredictions.
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// Watch stdin; every Enter tightens the learning-rate schedule.
    #[arg(long)]
    interactive: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run_cli(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_cli(cli: Cli) -> descent_nn::Result<()> {
    let config = match &cli.config {
        Some(path) => TrainConfig::load_json(path)?,
        None => TrainConfig::default(),
    };
    let spec = match &cli.model {
        Some(path) => ModelSpec::load_json(path)?,
        None => ModelSpec::default(),
    };
    let model = spec.build()?;

    let datasets = Datasets {
        training: load_examples(&cli.train_images, &cli.train_labels)?,
        validation: match (&cli.validation_images, &cli.validation_labels) {
            (Some(images), Some(labels)) => load_examples(images, labels)?,
            _ => Vec::new(),
        },
        testing: load_examples(&cli.test_images, &cli.test_labels)?,
    };

    std::fs::create_dir_all(&cli.out_dir)?;
    let mut sink = SinkFanout::new().with(JsonSnapshot::new(cli.out_dir.join("parameters.json")));
    if has_square_inputs(&datasets) {
        sink = sink
            .with(IdxWeightSquares::new(cli.out_dir.join("parameters")))
            .with(PngWeightSquares::new(cli.out_dir.join("weights")));
    }

    let (tx, rx) = mpsc::channel();
    let mut hooks = TrainHooks::new().with_progress(tx);
    if cli.interactive {
        let stop = StopSignal::new();
        watch_stdin(stop.clone());
        hooks = hooks.with_stop(stop);
    }
    let printer = thread::spawn(move || print_progress(rx));

    let report = run(&model, &datasets, &config, hooks, &mut sink)?;
    // The hooks (and with them the sender) are gone once `run` returns.
    if printer.join().is_err() {
        warn!("progress printer panicked");
    }

    println!("error rate (%): {:.2}", report.evaluation.error_percent());
    write_mispredictions(&cli.out_dir.join("incorrect_predictions.json"), &report)?;
    Ok(())
}

fn has_square_inputs(datasets: &Datasets) -> bool {
    datasets.training.first().is_some_and(|e| {
        let side = (e.dimension() as f64).sqrt().round() as usize;
        side > 0 && side * side == e.dimension()
    })
}

/// One dot per progress event, one line per epoch.
fn print_progress(rx: mpsc::Receiver<TrainEvent>) {
    let mut stdout = io::stdout();
    for event in rx {
        match event {
            TrainEvent::Progress { .. } => {
                print!(".");
            }
            TrainEvent::Epoch(_) | TrainEvent::Finished { .. } => {
                println!();
            }
        }
        let _ = stdout.flush();
    }
}

fn watch_stdin(stop: StopSignal) {
    info!("press Enter to lower the learning rate");
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if line.is_err() {
                break;
            }
            stop.request();
        }
    });
}

fn write_mispredictions(path: &Path, report: &descent_nn::RunReport) -> descent_nn::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(io::BufWriter::new(file), &report.evaluation.mispredictions)?;
    info!("saved {} mispredictions to {}", report.evaluation.mispredictions.len(), path.display());
    Ok(())
}
