//! CSV catalog loader

use super::error::CatalogError;
use super::types::{ApprovalPolicy, MetricCatalog, MetricDefinition};
use crate::stats::StatOperation;
use std::io::Read;
use std::path::Path;

/// Required header row, matched case-insensitively after trimming
pub const CATALOG_HEADERS: [&str; 4] = ["MetricName", "PromQLQuery", "Approved", "StatOperation"];

/// Load a catalog from a CSV file
pub fn load_catalog(path: &Path, policy: ApprovalPolicy) -> Result<MetricCatalog, CatalogError> {
    let reader = reader_builder()
        .from_path(path)
        .map_err(|source| CatalogError::Open {
            path: path.to_path_buf(),
            source,
        })?;

    let catalog = read_catalog(reader, policy)?;
    tracing::info!(
        path = %path.display(),
        metrics = catalog.len(),
        evaluated = catalog.evaluated_count(),
        "Loaded metric catalog"
    );
    Ok(catalog)
}

/// Parse a catalog from any reader (useful for testing)
pub fn parse_catalog<R: Read>(input: R, policy: ApprovalPolicy) -> Result<MetricCatalog, CatalogError> {
    read_catalog(reader_builder().from_reader(input), policy)
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    // Row width is checked by hand so the error names the offending line
    builder.has_headers(true).flexible(true);
    builder
}

fn read_catalog<R: Read>(
    mut reader: csv::Reader<R>,
    policy: ApprovalPolicy,
) -> Result<MetricCatalog, CatalogError> {
    let headers = reader.headers().map_err(CatalogError::Header)?.clone();
    validate_headers(&headers)?;

    let mut definitions = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|source| CatalogError::Row {
            line: source.position().map(|p| p.line()).unwrap_or(0),
            source,
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        definitions.push(parse_row(&record, line, policy)?);
    }

    Ok(MetricCatalog::new(definitions))
}

fn validate_headers(headers: &csv::StringRecord) -> Result<(), CatalogError> {
    let matches = headers.len() == CATALOG_HEADERS.len()
        && headers
            .iter()
            .zip(CATALOG_HEADERS)
            .all(|(actual, expected)| actual.trim().eq_ignore_ascii_case(expected));

    if matches {
        Ok(())
    } else {
        Err(CatalogError::InvalidHeaders {
            expected: CATALOG_HEADERS.iter().map(|h| h.to_string()).collect(),
            actual: headers.iter().map(|h| h.to_string()).collect(),
        })
    }
}

fn parse_row(
    record: &csv::StringRecord,
    line: u64,
    policy: ApprovalPolicy,
) -> Result<MetricDefinition, CatalogError> {
    if record.len() != CATALOG_HEADERS.len() {
        return Err(CatalogError::RowLength {
            line,
            actual: record.len(),
        });
    }

    let name = record[0].trim();
    if name.is_empty() {
        return Err(CatalogError::EmptyName { line });
    }

    Ok(MetricDefinition {
        name: name.to_string(),
        query_expression: record[1].trim().to_string(),
        approved: policy.resolve(&record[2]),
        stat_operation: StatOperation::parse(&record[3]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const LATENCY_QUERY: &str = "histogram_quantile(0.95,sum(rate(oe_grpc_server_handling_seconds_bucket{k8s_pod=~\"offers-engine-live.*\"}[5m])) by (le)) * 1000";

    #[test]
    fn test_parse_catalog() {
        let csv_data = format!(
            "MetricName,PromQLQuery,Approved,StatOperation\n\
             Min. Latency (ms) (P95),\"{}\",true,MIN\n\
             Error rate,sum(rate(errors_total[5m])),false,\n",
            LATENCY_QUERY.replace('"', "\"\"")
        );

        let catalog = parse_catalog(csv_data.as_bytes(), ApprovalPolicy::AssumeApproved).unwrap();

        assert_eq!(catalog.len(), 2);
        let first = &catalog.definitions()[0];
        assert_eq!(first.name, "Min. Latency (ms) (P95)");
        assert_eq!(first.query_expression, LATENCY_QUERY);
        assert_eq!(first.stat_operation, StatOperation::Min);
        assert!(first.approved);

        let second = &catalog.definitions()[1];
        assert_eq!(second.stat_operation, StatOperation::NotSet);
        // Approved column is ignored under the default policy
        assert!(second.approved);
    }

    #[test]
    fn test_trust_catalog_policy() {
        let csv_data = "MetricName,PromQLQuery,Approved,StatOperation\n\
                        a,up,true,MAX\n\
                        b,up,false,MAX\n";

        let catalog = parse_catalog(csv_data.as_bytes(), ApprovalPolicy::TrustCatalog).unwrap();
        assert!(catalog.definitions()[0].approved);
        assert!(!catalog.definitions()[1].approved);
    }

    #[test]
    fn test_headers_case_insensitive_and_trimmed() {
        let csv_data = " metricname , PROMQLQUERY,approved,statOperation\nLatency,up,true,MIN\n";
        let catalog = parse_catalog(csv_data.as_bytes(), ApprovalPolicy::default()).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_invalid_headers() {
        let csv_data = "MetricName,PromQLQuery,Approved,InvalidHeader\nLatency,up,true,MIN\n";
        let err = parse_catalog(csv_data.as_bytes(), ApprovalPolicy::default()).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidHeaders { .. }));

        let err = parse_catalog("".as_bytes(), ApprovalPolicy::default()).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidHeaders { .. }));
    }

    #[test]
    fn test_wrong_row_length_is_fatal() {
        let csv_data = "MetricName,PromQLQuery,Approved,StatOperation\n\
                        ok,up,true,MIN\n\
                        short,up,true\n";

        let err = parse_catalog(csv_data.as_bytes(), ApprovalPolicy::default()).unwrap_err();
        match err {
            CatalogError::RowLength { line, actual } => {
                assert_eq!(line, 3);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_name_is_fatal() {
        let csv_data = "MetricName,PromQLQuery,Approved,StatOperation\n  ,up,true,MIN\n";
        let err = parse_catalog(csv_data.as_bytes(), ApprovalPolicy::default()).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyName { line: 2 }));
    }

    #[test]
    fn test_unknown_operation_is_kept() {
        let csv_data = "MetricName,PromQLQuery,Approved,StatOperation\nLatency,up,true,P50\n";
        let catalog = parse_catalog(csv_data.as_bytes(), ApprovalPolicy::default()).unwrap();
        assert_eq!(
            catalog.definitions()[0].stat_operation,
            StatOperation::Other("P50".to_string())
        );
    }

    #[test]
    fn test_load_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "MetricName,PromQLQuery,Approved,StatOperation").unwrap();
        writeln!(file, "Latency,up,true,MEDIAN").unwrap();
        file.flush().unwrap();

        let catalog = load_catalog(file.path(), ApprovalPolicy::default()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.definitions()[0].stat_operation, StatOperation::Median);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_catalog(Path::new("/nonexistent/catalog.csv"), ApprovalPolicy::default())
            .unwrap_err();
        assert!(matches!(err, CatalogError::Open { .. }));
    }
}
