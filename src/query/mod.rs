//! Time-Series Query Client
//!
//! Turns one `(expression, window)` pair into the sample series the backend
//! returns for it. All network and protocol concerns stay behind the
//! [`TimeSeriesSource`] trait, so the evaluator can run against a fake source
//! in tests.
//!
//! ## Components
//!
//! - **TimeSeriesSource**: the query contract
//! - **GrafanaClient**: range queries through Grafana's `/api/ds/query` endpoint
//! - **wire**: request and response DTOs for that endpoint

mod client;
mod error;
pub mod wire;

pub use client::{GrafanaClient, GrafanaConfig};
pub use error::{QueryError, QueryResult};

use crate::window::TimeWindow;
use async_trait::async_trait;

/// Numeric samples returned for one query, in backend (time) order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    values: Vec<f64>,
}

impl SampleSeries {
    /// Wrap a vector of samples
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Samples as a slice
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Get the number of samples
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<f64>> for SampleSeries {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

/// A backend that can evaluate a query expression over a time window
#[async_trait]
pub trait TimeSeriesSource: Send + Sync {
    /// Fetch the sample series for `expression` over `window`
    async fn fetch(&self, expression: &str, window: TimeWindow) -> QueryResult<SampleSeries>;
}
