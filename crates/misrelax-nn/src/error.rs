//! Error types for misrelax-nn.

use thiserror::Error;

/// Error type for network construction and training.
#[derive(Debug, Error)]
pub enum Error {
    /// Candle tensor error.
    #[error("tensor error: {0}")]
    Tensor(#[from] candle_core::Error),

    /// Graph, QUBO or decoding error.
    #[error("graph error: {0}")]
    Core(#[from] misrelax_core::Error),

    /// Dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Invalid configuration.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Loss became NaN or infinite.
    #[error("training diverged at epoch {epoch} (last finite loss: {last_finite_loss:?})")]
    Diverged {
        epoch: usize,
        last_finite_loss: Option<f32>,
    },

    /// Training error.
    #[error("training error: {0}")]
    Training(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
