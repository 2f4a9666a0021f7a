//! # opex-pulse
//!
//! Metric evaluation pipeline: read a catalog of PromQL metric definitions,
//! query each one through Grafana over a time window, reduce the returned
//! samples to a single statistic, and write the results as a report.
//!
//! ## Modules
//!
//! - [`catalog`]: metric definitions and the CSV catalog loader
//! - [`window`]: evaluation time window and command-line time parsing
//! - [`stats`]: statistic operations, reducers and the reducer registry
//! - [`query`]: the time-series source contract and the Grafana client
//! - [`evaluator`]: the orchestrator that runs a catalog end to end
//! - [`report`]: CSV, JSON and table report writers
//! - [`credential`]: credential file loading
//! - [`config`]: TOML and environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use opex_pulse::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = load_catalog("sample.csv".as_ref(), ApprovalPolicy::default())?;
//!     let window = TimeWindow::from_epoch_secs(1_633_046_400, 1_633_132_800)?;
//!
//!     let token = load_token("cookie.txt".as_ref())?;
//!     let client = GrafanaClient::new(GrafanaConfig::default(), &token)?;
//!
//!     let evaluator = Evaluator::new(
//!         Arc::new(client),
//!         Arc::new(ReducerRegistry::standard()),
//!         EvaluationOptions::default(),
//!     );
//!     let report = evaluator.run(&catalog, window).await;
//!
//!     write_report_file("output.csv".as_ref(), ReportFormat::Csv, &report)?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod credential;
pub mod evaluator;
pub mod query;
pub mod report;
pub mod stats;
pub mod window;

// Re-export top-level types for convenience
pub use catalog::{
    load_catalog, parse_catalog, ApprovalPolicy, CatalogError, MetricCatalog, MetricDefinition,
};

pub use window::{parse_time_arg, resolve_window, TimeRangeError, TimeWindow};

pub use stats::{round_to_cents, Reducer, ReducerRegistry, StatOperation, StatsError};

pub use query::{GrafanaClient, GrafanaConfig, QueryError, SampleSeries, TimeSeriesSource};

pub use evaluator::{
    cancellation, CancelHandle, CancelToken, EvaluationError, EvaluationOptions,
    EvaluationReport, Evaluator, MetricOutcome, OutcomeStatus,
};

pub use report::{write_report, write_report_file, ReportError, ReportFormat};

pub use credential::{load_token, CredentialError};

pub use config::{Config, ConfigError, EvaluationConfig, LoggingConfig};
