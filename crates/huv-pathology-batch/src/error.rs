//! Batch errors.

use std::path::PathBuf;

use huv_pathology_core::PathologyError;
use thiserror::Error;

/// Batch errors.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Could not read text for {}: {message}", .path.display())]
    Source { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pipeline error: {0}")]
    Core(#[from] PathologyError),

    #[error("Batch cancelled")]
    Cancelled,
}

pub type BatchResult<T> = Result<T, BatchError>;

impl BatchError {
    pub fn source_error(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        BatchError::Source {
            path: path.into(),
            message: message.into(),
        }
    }
}
