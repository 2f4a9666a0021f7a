//! Catalog loading errors
//!
//! Every variant is fatal: a catalog that fails to load aborts the run before
//! any query is issued.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading a metric catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to open catalog {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to read catalog header: {0}")]
    Header(#[source] csv::Error),

    #[error("Invalid headers. Expected: {expected:?}, Got: {actual:?}")]
    InvalidHeaders {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Failed to read catalog row at line {line}: {source}")]
    Row {
        line: u64,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid row length at line {line}: expected 4, got {actual}")]
    RowLength { line: u64, actual: usize },

    #[error("Empty metric name at line {line}")]
    EmptyName { line: u64 },
}
