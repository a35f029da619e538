use thiserror::Error;

/// Errors surfaced by dataset loading, configuration and training.
///
/// Every variant is fatal for the run that produced it. Numerical divergence
/// and operator cancellation are handled by the training schedule and never
/// show up here.
#[derive(Debug, Error)]
pub enum Error {
    /// Datum dimensionality, record counts or parameter shapes disagree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// An encoded dataset violates the IDX header convention.
    #[error("malformed dataset: {0}")]
    MalformedDataset(String),

    #[error("empty dataset: {0}")]
    EmptyDataset(&'static str),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, Error>;
