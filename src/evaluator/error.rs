//! Per-metric evaluation errors
//!
//! None of these abort a run; they are recorded on the metric's outcome.

use crate::query::QueryError;
use crate::stats::StatsError;
use thiserror::Error;

/// Why a single metric failed to evaluate
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// The backend query failed or returned an unusable response
    #[error(transparent)]
    Query(#[from] QueryError),

    /// No reducer for the operation, or the reducer result was unusable
    #[error(transparent)]
    Reducer(#[from] StatsError),

    /// The run was cancelled before this metric finished
    #[error("Evaluation cancelled")]
    Cancelled,

    /// The run deadline passed before this metric finished
    #[error("Run deadline exceeded")]
    DeadlineExceeded,
}

impl EvaluationError {
    /// Short machine-friendly classification, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Query(QueryError::MalformedResponse { .. }) => "malformed_response",
            Self::Query(_) => "query_failed",
            Self::Reducer(StatsError::ReducerNotFound(_)) => "reducer_not_found",
            Self::Reducer(_) => "non_finite_result",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        let err: EvaluationError = QueryError::failed("up", "boom").into();
        assert_eq!(err.kind(), "query_failed");

        let err: EvaluationError = QueryError::malformed("up", "no frames").into();
        assert_eq!(err.kind(), "malformed_response");

        let err: EvaluationError = StatsError::ReducerNotFound("P50".into()).into();
        assert_eq!(err.kind(), "reducer_not_found");
        assert_eq!(err.to_string(), "No reducer registered for operation 'P50'");

        assert_eq!(EvaluationError::Cancelled.kind(), "cancelled");
    }
}
