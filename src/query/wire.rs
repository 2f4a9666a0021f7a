//! Grafana `/api/ds/query` wire format
//!
//! Request: one range query plus the window as millisecond strings.
//! Response: result key (the query's `refId`) → frames, each frame holding
//! column-oriented `values` where column 0 is timestamps and the remaining
//! columns are series values.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================
// Request DTOs
// ============================================

/// Body of a datasource query request
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryRequest {
    pub queries: Vec<RangeQuery>,
    pub from: String,
    pub to: String,
}

/// A single range query against one datasource
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RangeQuery {
    pub datasource: DatasourceRef,
    pub exemplar: bool,
    pub expr: String,
    pub format: String,
    pub hide: bool,
    pub interval: String,
    pub interval_factor: u32,
    pub legend_format: String,
    pub ref_id: String,
    pub editor_mode: String,
    pub range: bool,
    pub request_id: String,
    pub utc_offset_sec: i32,
    pub datasource_id: u32,
    pub interval_ms: u64,
    pub max_data_points: u32,
}

/// Datasource identity
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DatasourceRef {
    #[serde(rename = "type")]
    pub kind: String,
    pub uid: String,
}

// ============================================
// Response DTOs
// ============================================

/// Top-level query response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: HashMap<String, QueryResultEntry>,
}

/// Result for one `refId`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResultEntry {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub frames: Vec<Frame>,
}

/// One data frame (one series)
#[derive(Debug, Clone, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub schema: Option<FrameSchema>,
    pub data: FrameData,
}

/// Frame schema; column names label extraction errors
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameSchema {
    #[serde(default)]
    pub fields: Vec<FrameField>,
}

/// A column description
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameField {
    #[serde(default)]
    pub name: String,
}

impl Frame {
    /// Human-readable label for a value column: its schema name when known
    pub fn column_label(&self, column: usize) -> String {
        self.schema
            .as_ref()
            .and_then(|schema| schema.fields.get(column))
            .filter(|field| !field.name.is_empty())
            .map(|field| format!("'{}'", field.name))
            .unwrap_or_else(|| column.to_string())
    }
}

/// Column-oriented frame values
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameData {
    #[serde(default)]
    pub values: Vec<Vec<serde_json::Value>>,
}

impl QueryResponse {
    /// Extract the numeric samples of the first frame for `ref_id`
    ///
    /// Every position in the value column must hold a number; a `null` gap or
    /// any other type is reported rather than skipped.
    pub fn extract_samples(&self, ref_id: &str, value_column: usize) -> Result<Vec<f64>, String> {
        let entry = self
            .results
            .get(ref_id)
            .ok_or_else(|| format!("no result for refId '{}'", ref_id))?;

        let frame = entry
            .frames
            .first()
            .ok_or_else(|| format!("result '{}' has no frames", ref_id))?;

        let column = frame.data.values.get(value_column).ok_or_else(|| {
            format!(
                "frame has {} value columns, expected column {}",
                frame.data.values.len(),
                frame.column_label(value_column)
            )
        })?;

        column
            .iter()
            .enumerate()
            .map(|(idx, value)| {
                value.as_f64().ok_or_else(|| {
                    format!(
                        "invalid type in column {} at index {}: expected number, got {}",
                        frame.column_label(value_column),
                        idx,
                        json_type_name(value)
                    )
                })
            })
            .collect()
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
