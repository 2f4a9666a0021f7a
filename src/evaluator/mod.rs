//! Evaluation Orchestrator
//!
//! Drives one run over a metric catalog:
//!
//! ```text
//! catalog row → skip if unset → fetch samples → reduce → round → outcome
//! ```
//!
//! Every per-metric failure (query, malformed response, missing reducer,
//! cancellation) is recorded on that metric's outcome; a run always returns
//! an [`EvaluationReport`], possibly with no successful values.
//!
//! Metrics are evaluated with at most [`EvaluationOptions::concurrency`]
//! queries in flight (1 = strictly sequential). Outcomes are always returned
//! in catalog order.

mod cancel;
mod error;
mod outcome;

pub use cancel::{cancellation, CancelHandle, CancelToken};
pub use error::EvaluationError;
pub use outcome::{EvaluationReport, MetricOutcome, OutcomeStatus};

use crate::catalog::{MetricCatalog, MetricDefinition};
use crate::query::TimeSeriesSource;
use crate::stats::ReducerRegistry;
use crate::window::TimeWindow;
use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tuning for one evaluation run
#[derive(Debug, Clone)]
pub struct EvaluationOptions {
    /// Maximum number of queries in flight
    pub concurrency: usize,
    /// Optional deadline for the whole run, applied to every in-flight query
    pub run_deadline: Option<Duration>,
}

impl Default for EvaluationOptions {
    fn default() -> Self {
        Self {
            concurrency: 1,
            run_deadline: None,
        }
    }
}

/// Evaluates metric catalogs against a time-series source
pub struct Evaluator {
    source: Arc<dyn TimeSeriesSource>,
    registry: Arc<ReducerRegistry>,
    options: EvaluationOptions,
}

impl Evaluator {
    /// Create a new evaluator
    pub fn new(
        source: Arc<dyn TimeSeriesSource>,
        registry: Arc<ReducerRegistry>,
        options: EvaluationOptions,
    ) -> Self {
        Self {
            source,
            registry,
            options,
        }
    }

    /// Evaluate every metric in `catalog` over `window`
    pub async fn run(&self, catalog: &MetricCatalog, window: TimeWindow) -> EvaluationReport {
        self.run_until_cancelled(catalog, window, CancelToken::never())
            .await
    }

    /// Evaluate every metric, stopping in-flight queries once `cancel` fires
    pub async fn run_until_cancelled(
        &self,
        catalog: &MetricCatalog,
        window: TimeWindow,
        cancel: CancelToken,
    ) -> EvaluationReport {
        let started = Instant::now();
        let deadline = self
            .options
            .run_deadline
            .map(|d| tokio::time::Instant::now() + d);
        let concurrency = self.options.concurrency.max(1);

        let pending: Vec<(usize, &MetricDefinition)> = catalog
            .iter()
            .filter(|def| {
                if def.is_evaluated() {
                    true
                } else {
                    tracing::debug!(metric = %def.name, "Skipping metric without statistic operation");
                    false
                }
            })
            .enumerate()
            .collect();
        let skipped = catalog.len() - pending.len();

        tracing::info!(
            window = %window,
            window_ms = window.duration_millis(),
            metrics = pending.len(),
            skipped,
            concurrency,
            "Starting evaluation run"
        );

        let mut indexed: Vec<(usize, MetricOutcome)> = stream::iter(pending)
            .map(|(idx, def)| {
                let cancel = cancel.clone();
                async move { (idx, self.evaluate_one(def, window, deadline, cancel).await) }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        // Completion order is arbitrary once concurrency > 1
        indexed.sort_by_key(|(idx, _)| *idx);

        let report = EvaluationReport {
            outcomes: indexed.into_iter().map(|(_, outcome)| outcome).collect(),
            skipped,
            elapsed: started.elapsed(),
        };

        tracing::info!(
            evaluated = report.success_count(),
            failed = report.failure_count(),
            skipped = report.skipped,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Evaluation run complete"
        );

        report
    }

    async fn evaluate_one(
        &self,
        definition: &MetricDefinition,
        window: TimeWindow,
        deadline: Option<tokio::time::Instant>,
        mut cancel: CancelToken,
    ) -> MetricOutcome {
        let status = match self
            .fetch_and_reduce(definition, window, deadline, &mut cancel)
            .await
        {
            Ok((value, sample_count)) => {
                tracing::debug!(
                    metric = %definition.name,
                    operation = %definition.stat_operation,
                    value,
                    samples = sample_count,
                    "Metric evaluated"
                );
                OutcomeStatus::Evaluated {
                    value,
                    sample_count,
                }
            }
            Err(error) => {
                tracing::warn!(
                    metric = %definition.name,
                    operation = %definition.stat_operation,
                    kind = error.kind(),
                    error = %error,
                    "Metric evaluation failed"
                );
                OutcomeStatus::Failed { error }
            }
        };

        MetricOutcome {
            definition: definition.clone(),
            status,
        }
    }

    async fn fetch_and_reduce(
        &self,
        definition: &MetricDefinition,
        window: TimeWindow,
        deadline: Option<tokio::time::Instant>,
        cancel: &mut CancelToken,
    ) -> Result<(f64, usize), EvaluationError> {
        if cancel.is_cancelled() {
            return Err(EvaluationError::Cancelled);
        }

        // Unknown operations fail without spending a backend round-trip
        self.registry.lookup(&definition.stat_operation)?;

        let series = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EvaluationError::Cancelled),
            _ = wait_for_deadline(deadline) => return Err(EvaluationError::DeadlineExceeded),
            result = self.source.fetch(&definition.query_expression, window) => result?,
        };

        let value = self
            .registry
            .reduce(&definition.stat_operation, series.as_slice())?;
        Ok((value, series.len()))
    }
}

async fn wait_for_deadline(deadline: Option<tokio::time::Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
