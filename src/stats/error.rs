//! Reducer error types

use thiserror::Error;

/// Errors raised while reducing a sample series
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// No reducer is registered for the requested operation
    #[error("No reducer registered for operation '{0}'")]
    ReducerNotFound(String),

    /// The reducer produced NaN or an infinity
    #[error("Reducer for '{operation}' produced a non-finite value ({value})")]
    NonFiniteResult { operation: String, value: f64 },
}

/// Result type for reducer operations
pub type StatsResult<T> = Result<T, StatsError>;
