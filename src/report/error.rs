//! Report writing errors

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while writing an evaluation report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to create report file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;
