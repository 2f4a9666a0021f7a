//! Reducer Registry
//!
//! Maps statistic operations to reducer functions. The registry is an explicit
//! object built once at startup and shared by reference with the evaluator,
//! which lets tests swap in their own reducers.

use super::error::{StatsError, StatsResult};
use super::operation::StatOperation;
use super::reducers;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A pure reduction from a sample series to one value
pub type Reducer = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Operation → reducer lookup table
#[derive(Clone, Default)]
pub struct ReducerRegistry {
    reducers: HashMap<StatOperation, Reducer>,
}

impl ReducerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in MIN/MAX/MEAN/MEDIAN/P90/P95/P99 reducers
    pub fn standard() -> Self {
        Self::new()
            .with(StatOperation::Min, reducers::min)
            .with(StatOperation::Max, reducers::max)
            .with(StatOperation::Mean, reducers::mean)
            .with(StatOperation::Median, reducers::median)
            .with(StatOperation::P90, reducers::p90)
            .with(StatOperation::P95, reducers::p95)
            .with(StatOperation::P99, reducers::p99)
    }

    /// Builder method: register a reducer
    pub fn with<F>(mut self, op: StatOperation, reducer: F) -> Self
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        self.register(op, reducer);
        self
    }

    /// Register (or replace) the reducer for an operation
    pub fn register<F>(&mut self, op: StatOperation, reducer: F)
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        self.reducers.insert(op, Arc::new(reducer));
    }

    /// Look up the reducer for an operation
    pub fn lookup(&self, op: &StatOperation) -> StatsResult<&Reducer> {
        self.reducers
            .get(op)
            .ok_or_else(|| StatsError::ReducerNotFound(op.to_string()))
    }

    /// Whether a reducer is registered for `op`
    pub fn contains(&self, op: &StatOperation) -> bool {
        self.reducers.contains_key(op)
    }

    /// Reduce `samples` with the reducer for `op` and round to two decimals
    pub fn reduce(&self, op: &StatOperation, samples: &[f64]) -> StatsResult<f64> {
        let reducer = self.lookup(op)?;
        let value = round_to_cents(reducer(samples));

        if !value.is_finite() {
            return Err(StatsError::NonFiniteResult {
                operation: op.to_string(),
                value,
            });
        }

        Ok(value)
    }

    /// Number of registered reducers
    pub fn len(&self) -> usize {
        self.reducers.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.reducers.is_empty()
    }
}

impl fmt::Debug for ReducerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ops: Vec<String> = self.reducers.keys().map(|op| op.to_string()).collect();
        ops.sort();
        f.debug_struct("ReducerRegistry").field("operations", &ops).finish()
    }
}

/// Round to two decimal places, half away from zero
///
/// Magnitudes too large to scale by 100 have no fractional part and are
/// returned unchanged.
pub fn round_to_cents(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    scaled.round() / 100.0
}
