//! Catalog data types

use crate::stats::StatOperation;
use serde::{Deserialize, Serialize};

/// One row of the metric catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    /// Human-readable label, used only for reporting
    pub name: String,
    /// Query expression handed verbatim to the backend
    pub query_expression: String,
    /// Carried through to the report, no effect on evaluation
    pub approved: bool,
    /// Reducer selector, or [`StatOperation::NotSet`] to skip the metric
    pub stat_operation: StatOperation,
}

impl MetricDefinition {
    /// Create a new metric definition
    pub fn new(
        name: impl Into<String>,
        query_expression: impl Into<String>,
        approved: bool,
        stat_operation: StatOperation,
    ) -> Self {
        Self {
            name: name.into(),
            query_expression: query_expression.into(),
            approved,
            stat_operation,
        }
    }

    /// Whether the orchestrator should evaluate this metric
    pub fn is_evaluated(&self) -> bool {
        !self.stat_operation.is_not_set()
    }
}

/// How the `Approved` column is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// Ignore the column and mark every metric approved
    #[default]
    AssumeApproved,
    /// Use the column: `true` (any case) is approved, anything else is not
    TrustCatalog,
}

impl ApprovalPolicy {
    /// Interpret an `Approved` cell under this policy
    pub fn resolve(&self, cell: &str) -> bool {
        match self {
            Self::AssumeApproved => true,
            Self::TrustCatalog => cell.trim().eq_ignore_ascii_case("true"),
        }
    }
}

/// An ordered collection of metric definitions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricCatalog {
    definitions: Vec<MetricDefinition>,
}

impl MetricCatalog {
    /// Create a catalog from definitions, preserving their order
    pub fn new(definitions: Vec<MetricDefinition>) -> Self {
        Self { definitions }
    }

    /// Definitions in catalog order
    pub fn definitions(&self) -> &[MetricDefinition] {
        &self.definitions
    }

    /// Iterate definitions in catalog order
    pub fn iter(&self) -> std::slice::Iter<'_, MetricDefinition> {
        self.definitions.iter()
    }

    /// Number of definitions that will actually be evaluated
    pub fn evaluated_count(&self) -> usize {
        self.definitions.iter().filter(|d| d.is_evaluated()).count()
    }

    /// Get the number of definitions
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl From<Vec<MetricDefinition>> for MetricCatalog {
    fn from(definitions: Vec<MetricDefinition>) -> Self {
        Self::new(definitions)
    }
}

impl<'a> IntoIterator for &'a MetricCatalog {
    type Item = &'a MetricDefinition;
    type IntoIter = std::slice::Iter<'a, MetricDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.definitions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_policy() {
        assert!(ApprovalPolicy::AssumeApproved.resolve("false"));
        assert!(ApprovalPolicy::AssumeApproved.resolve(""));
        assert!(ApprovalPolicy::TrustCatalog.resolve(" TRUE "));
        assert!(!ApprovalPolicy::TrustCatalog.resolve("no"));
        assert_eq!(ApprovalPolicy::default(), ApprovalPolicy::AssumeApproved);
    }

    #[test]
    fn test_evaluated_count() {
        let catalog = MetricCatalog::new(vec![
            MetricDefinition::new("a", "up", true, StatOperation::Min),
            MetricDefinition::new("b", "up", true, StatOperation::NotSet),
            MetricDefinition::new("c", "up", true, StatOperation::parse("BOGUS")),
        ]);
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.evaluated_count(), 2);
        assert!(!catalog.definitions()[1].is_evaluated());
    }
}
