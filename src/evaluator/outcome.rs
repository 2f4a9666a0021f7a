//! Evaluation outcomes
//!
//! A run produces one [`MetricOutcome`] per evaluated metric, in catalog
//! order. Metrics whose operation is unset produce no outcome at all; they
//! are only counted in [`EvaluationReport::skipped`].

use super::error::EvaluationError;
use crate::catalog::MetricDefinition;
use std::time::Duration;

/// Result of evaluating one metric
#[derive(Debug)]
pub struct MetricOutcome {
    /// The catalog row this outcome belongs to
    pub definition: MetricDefinition,
    /// Value or failure reason
    pub status: OutcomeStatus,
}

/// Success value or failure reason for one metric
#[derive(Debug)]
pub enum OutcomeStatus {
    /// Reduced and rounded value
    Evaluated {
        /// Rounded to two decimals, always finite
        value: f64,
        /// Number of samples the backend returned
        sample_count: usize,
    },
    /// The metric could not be evaluated
    Failed { error: EvaluationError },
}

impl MetricOutcome {
    /// The value, if the metric evaluated successfully
    pub fn value(&self) -> Option<f64> {
        match self.status {
            OutcomeStatus::Evaluated { value, .. } => Some(value),
            OutcomeStatus::Failed { .. } => None,
        }
    }

    /// The failure, if the metric did not evaluate
    pub fn error(&self) -> Option<&EvaluationError> {
        match &self.status {
            OutcomeStatus::Evaluated { .. } => None,
            OutcomeStatus::Failed { error } => Some(error),
        }
    }

    /// Check if the metric evaluated successfully
    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Evaluated { .. })
    }
}

/// Everything one evaluation run produced
#[derive(Debug, Default)]
pub struct EvaluationReport {
    /// Outcomes in catalog order
    pub outcomes: Vec<MetricOutcome>,
    /// Metrics left out because their operation was unset
    pub skipped: usize,
    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl EvaluationReport {
    /// Successfully evaluated metrics with their values, in catalog order
    pub fn results(&self) -> impl Iterator<Item = (&MetricDefinition, f64)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.value().map(|v| (&o.definition, v)))
    }

    /// Failed metrics with their errors, in catalog order
    pub fn failures(&self) -> impl Iterator<Item = (&MetricDefinition, &EvaluationError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.error().map(|e| (&o.definition, e)))
    }

    /// Number of metrics that evaluated successfully
    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of metrics that failed
    pub fn failure_count(&self) -> usize {
        self.outcomes.len() - self.success_count()
    }
}

impl std::fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} evaluated, {} failed, {} skipped in {:.2}s",
            self.success_count(),
            self.failure_count(),
            self.skipped,
            self.elapsed.as_secs_f64()
        )
    }
}
