//! Report Writers
//!
//! Render an [`EvaluationReport`] in one of three formats:
//!
//! - `csv`: one row per successfully evaluated metric
//!   (`MetricName,PromQLQuery,Approved,StatOperation,Value`), value with two decimals
//! - `json`: every outcome, including failures with their kind and message
//! - `table`: aligned console output

mod error;

pub use error::{ReportError, ReportResult};

use crate::evaluator::{EvaluationReport, MetricOutcome, OutcomeStatus};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Header row of the CSV report
pub const REPORT_HEADERS: [&str; 5] = [
    "MetricName",
    "PromQLQuery",
    "Approved",
    "StatOperation",
    "Value",
];

/// Output format for a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
    Table,
}

/// Write `report` to `path` in the given format, or to stdout when `path` is `-`
pub fn write_report_file(
    path: &Path,
    format: ReportFormat,
    report: &EvaluationReport,
) -> ReportResult<()> {
    if path.as_os_str() == "-" {
        let stdout = io::stdout();
        return write_report(stdout.lock(), format, report);
    }

    let file = File::create(path).map_err(|source| ReportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    write_report(BufWriter::new(file), format, report)?;

    tracing::info!(
        path = %path.display(),
        format = ?format,
        rows = report.success_count(),
        "Report written"
    );
    Ok(())
}

/// Write `report` to any writer in the given format
pub fn write_report<W: Write>(
    writer: W,
    format: ReportFormat,
    report: &EvaluationReport,
) -> ReportResult<()> {
    match format {
        ReportFormat::Csv => write_csv(writer, report),
        ReportFormat::Json => write_json(writer, report),
        ReportFormat::Table => write_table(writer, report),
    }
}

/// Write the CSV report. The header is written even when nothing succeeded.
pub fn write_csv<W: Write>(writer: W, report: &EvaluationReport) -> ReportResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(REPORT_HEADERS)?;

    for (definition, value) in report.results() {
        csv_writer.write_record([
            definition.name.as_str(),
            definition.query_expression.as_str(),
            if definition.approved { "true" } else { "false" },
            definition.stat_operation.to_string().as_str(),
            format!("{:.2}", value).as_str(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    evaluated: usize,
    failed: usize,
    skipped: usize,
    elapsed_ms: u64,
    metrics: Vec<JsonOutcome<'a>>,
}

#[derive(Debug, Serialize)]
struct JsonOutcome<'a> {
    name: &'a str,
    query: &'a str,
    approved: bool,
    stat_operation: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    samples: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<'a> From<&'a MetricOutcome> for JsonOutcome<'a> {
    fn from(outcome: &'a MetricOutcome) -> Self {
        let definition = &outcome.definition;
        let mut json = JsonOutcome {
            name: &definition.name,
            query: &definition.query_expression,
            approved: definition.approved,
            stat_operation: definition.stat_operation.to_string(),
            status: "ok",
            value: None,
            samples: None,
            error_kind: None,
            error: None,
        };

        match &outcome.status {
            OutcomeStatus::Evaluated {
                value,
                sample_count,
            } => {
                json.value = Some(*value);
                json.samples = Some(*sample_count);
            }
            OutcomeStatus::Failed { error } => {
                json.status = "failed";
                json.error_kind = Some(error.kind());
                json.error = Some(error.to_string());
            }
        }

        json
    }
}

/// Write every outcome as a pretty-printed JSON document
pub fn write_json<W: Write>(mut writer: W, report: &EvaluationReport) -> ReportResult<()> {
    let document = JsonReport {
        evaluated: report.success_count(),
        failed: report.failure_count(),
        skipped: report.skipped,
        elapsed_ms: report.elapsed.as_millis() as u64,
        metrics: report.outcomes.iter().map(JsonOutcome::from).collect(),
    };

    serde_json::to_writer_pretty(&mut writer, &document)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Write an aligned console table of every outcome
pub fn write_table<W: Write>(mut writer: W, report: &EvaluationReport) -> ReportResult<()> {
    if report.outcomes.is_empty() {
        writeln!(writer, "No metrics evaluated.")?;
        writeln!(writer, "{}", report)?;
        return Ok(());
    }

    let name_width = report
        .outcomes
        .iter()
        .map(|o| o.definition.name.len())
        .max()
        .unwrap_or(0)
        .max("Metric".len());

    writeln!(
        writer,
        "{:<name_width$}  {:<10}  {:>12}  {}",
        "Metric", "Operation", "Value", "Status",
    )?;
    writeln!(writer, "{}", "-".repeat(name_width + 40))?;

    for outcome in &report.outcomes {
        let definition = &outcome.definition;
        let (value, status) = match &outcome.status {
            OutcomeStatus::Evaluated { value, .. } => (format!("{:.2}", value), "ok".to_string()),
            OutcomeStatus::Failed { error } => ("-".to_string(), error.to_string()),
        };
        writeln!(
            writer,
            "{:<name_width$}  {:<10}  {:>12}  {}",
            definition.name,
            definition.stat_operation.to_string(),
            value,
            status,
        )?;
    }

    writeln!(writer)?;
    writeln!(writer, "{}", report)?;
    writer.flush()?;
    Ok(())
}
