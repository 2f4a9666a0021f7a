//! Query error types

use thiserror::Error;

/// Errors that can occur while querying the backend
///
/// `Failed` and `MalformedResponse` are per-metric and never abort a run.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Transport error, timeout, non-success status or backend-reported error
    #[error("Query failed for '{expression}': {reason}")]
    Failed { expression: String, reason: String },

    /// The response did not have the expected shape
    #[error("Malformed response for '{expression}': {reason}")]
    MalformedResponse { expression: String, reason: String },

    /// A configured header name or value is not valid HTTP
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl QueryError {
    /// Build a `Failed` error for an expression
    pub fn failed(expression: &str, reason: impl Into<String>) -> Self {
        Self::Failed {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a `MalformedResponse` error for an expression
    pub fn malformed(expression: &str, reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for query operations
pub type QueryResult<T> = Result<T, QueryError>;
