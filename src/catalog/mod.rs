//! Metric Catalog
//!
//! The ordered list of metric definitions evaluated in one run, and the CSV
//! loader that reads it.
//!
//! ## Catalog format
//!
//! ```text
//! MetricName,PromQLQuery,Approved,StatOperation
//! Latency P95 (ms),histogram_quantile(0.95, ...) * 1000,true,MAX
//! Error rate,sum(rate(errors_total[5m])),true,
//! ```
//!
//! A row with an empty `StatOperation` is kept in the catalog but skipped
//! during evaluation.

mod error;
mod loader;
mod types;

pub use error::CatalogError;
pub use loader::{load_catalog, parse_catalog, CATALOG_HEADERS};
pub use types::{ApprovalPolicy, MetricCatalog, MetricDefinition};
