//! Statistic operation tags
//!
//! The `StatOperation` column of a catalog row selects how a metric's series
//! is summarised. An empty cell means "do not evaluate this metric".

use serde::{Deserialize, Serialize};
use std::fmt;

/// Statistic operation requested for a metric
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum StatOperation {
    /// Empty cell: the metric is skipped during evaluation
    NotSet,
    /// Smallest sample
    Min,
    /// Largest sample
    Max,
    /// Arithmetic mean
    Mean,
    /// 50th percentile
    Median,
    /// 90th percentile
    P90,
    /// 95th percentile
    P95,
    /// 99th percentile
    P99,
    /// Any tag without a built-in meaning, kept verbatim
    Other(String),
}

impl StatOperation {
    /// Every built-in operation with a standard reducer
    pub fn builtin() -> &'static [StatOperation] {
        const BUILTIN: &[StatOperation] = &[
            StatOperation::Min,
            StatOperation::Max,
            StatOperation::Mean,
            StatOperation::Median,
            StatOperation::P90,
            StatOperation::P95,
            StatOperation::P99,
        ];
        BUILTIN
    }

    /// Parse a catalog cell. Never fails: unknown tags become [`StatOperation::Other`].
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.to_uppercase().as_str() {
            "" => Self::NotSet,
            "MIN" => Self::Min,
            "MAX" => Self::Max,
            "MEAN" => Self::Mean,
            "MEDIAN" => Self::Median,
            "P90" => Self::P90,
            "P95" => Self::P95,
            "P99" => Self::P99,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Whether this metric should be skipped
    pub fn is_not_set(&self) -> bool {
        matches!(self, Self::NotSet)
    }

    /// Quantile probability for the rank-based operations
    pub fn quantile(&self) -> Option<f64> {
        match self {
            Self::Median => Some(0.5),
            Self::P90 => Some(0.90),
            Self::P95 => Some(0.95),
            Self::P99 => Some(0.99),
            _ => None,
        }
    }
}

impl fmt::Display for StatOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSet => Ok(()),
            Self::Min => write!(f, "MIN"),
            Self::Max => write!(f, "MAX"),
            Self::Mean => write!(f, "MEAN"),
            Self::Median => write!(f, "MEDIAN"),
            Self::P90 => write!(f, "P90"),
            Self::P95 => write!(f, "P95"),
            Self::P99 => write!(f, "P99"),
            Self::Other(tag) => write!(f, "{}", tag),
        }
    }
}

impl From<String> for StatOperation {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<StatOperation> for String {
    fn from(op: StatOperation) -> Self {
        op.to_string()
    }
}
