use serde::{Serialize, Deserialize};

/// Per-epoch diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Loss on the signal set; `None` when the run terminates on distance.
    pub loss: Option<f64>,
    /// Parameter distance covered during this epoch.
    pub distance: f64,
    /// Learning rate and momentum in effect during this epoch.
    pub learning_rate: f64,
    pub momentum: f64,
    /// ‖lr · gradient‖ / ‖parameters‖ at the last minibatch, before the
    /// momentum term is added; `None` when the parameters were zero.
    pub update_ratio: Option<f64>,
    /// Wall-clock duration of this single epoch in milliseconds.
    pub elapsed_ms: u64,
}

/// Why a training run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The loss or distance threshold was met.
    Converged,
    /// The configured number of epochs ran.
    EpochLimit,
    /// The learning rate fell below its floor.
    Exhausted,
}

/// Events sent over `TrainHooks::progress_tx`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TrainEvent {
    Progress { epoch: usize, consumed: usize, total: usize },
    Epoch(EpochStats),
    Finished { reason: TerminationReason, epochs: usize },
}
