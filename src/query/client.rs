//! Grafana datasource client
//!
//! Sends PromQL range queries through Grafana's datasource proxy
//! (`POST /api/ds/query`) and extracts the value column of the first series.

use super::error::{QueryError, QueryResult};
use super::wire::{DatasourceRef, QueryRequest, QueryResponse, RangeQuery};
use super::{SampleSeries, TimeSeriesSource};
use crate::window::TimeWindow;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Longest slice of an error body kept in a `QueryError`
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Backend endpoint, identity and request-shape settings
#[derive(Debug, Clone, Deserialize)]
pub struct GrafanaConfig {
    /// Base URL of the Grafana instance (e.g., "https://grafana.example.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `x-grafana-org-id` header
    #[serde(default = "default_org_id")]
    pub org_id: u32,

    /// Value of the `x-plugin-id` header
    #[serde(default = "default_plugin_id")]
    pub plugin_id: String,

    /// Datasource type, also sent as the `ds_type` query parameter
    #[serde(default = "default_datasource_type")]
    pub datasource_type: String,

    /// Datasource UID
    #[serde(default = "default_datasource_uid")]
    pub datasource_uid: String,

    /// Numeric datasource ID
    #[serde(default = "default_datasource_id")]
    pub datasource_id: u32,

    /// Optional `x-dashboard-uid` header
    #[serde(default)]
    pub dashboard_uid: Option<String>,

    /// `refId` of the query, and the result key read back
    #[serde(default = "default_ref_id")]
    pub ref_id: String,

    /// Step between points, in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Upper bound on points returned per series
    #[serde(default = "default_max_data_points")]
    pub max_data_points: u32,

    /// UTC offset reported to the datasource
    #[serde(default)]
    pub utc_offset_sec: i32,

    /// Request exemplars alongside samples
    #[serde(default)]
    pub exemplar: bool,

    /// Index of the numeric column in each frame (column 0 is time)
    #[serde(default = "default_value_column")]
    pub value_column: usize,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Header that carries the credential token
    #[serde(default = "default_credential_header")]
    pub credential_header: String,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_org_id() -> u32 {
    1
}

fn default_plugin_id() -> String {
    "prometheus".to_string()
}

fn default_datasource_type() -> String {
    "prometheus".to_string()
}

fn default_datasource_uid() -> String {
    "prometheus".to_string()
}

fn default_datasource_id() -> u32 {
    1
}

fn default_ref_id() -> String {
    "A".to_string()
}

fn default_interval_ms() -> u64 {
    60_000 // 1 minute, dashboard granularity
}

fn default_max_data_points() -> u32 {
    1320
}

fn default_value_column() -> usize {
    1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_credential_header() -> String {
    "cookie".to_string()
}

impl Default for GrafanaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            org_id: default_org_id(),
            plugin_id: default_plugin_id(),
            datasource_type: default_datasource_type(),
            datasource_uid: default_datasource_uid(),
            datasource_id: default_datasource_id(),
            dashboard_uid: None,
            ref_id: default_ref_id(),
            interval_ms: default_interval_ms(),
            max_data_points: default_max_data_points(),
            utc_offset_sec: 0,
            exemplar: false,
            value_column: default_value_column(),
            timeout_secs: default_timeout_secs(),
            credential_header: default_credential_header(),
            headers: HashMap::new(),
        }
    }
}

/// Grafana datasource query client
///
/// The credential token is read-only after construction, so one client can be
/// shared across concurrent queries.
#[derive(Debug)]
pub struct GrafanaClient {
    client: Client,
    config: GrafanaConfig,
}

impl GrafanaClient {
    /// Create a client that attaches `token` to every request
    pub fn new(config: GrafanaConfig, token: &str) -> QueryResult<Self> {
        let headers = default_headers(&config, token)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("opex-pulse/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(QueryError::Client)?;

        Ok(Self { client, config })
    }

    /// Build the request body for one range query
    pub fn build_request(&self, expression: &str, window: TimeWindow, request_id: &str) -> QueryRequest {
        QueryRequest {
            queries: vec![RangeQuery {
                datasource: DatasourceRef {
                    kind: self.config.datasource_type.clone(),
                    uid: self.config.datasource_uid.clone(),
                },
                exemplar: self.config.exemplar,
                expr: expression.to_string(),
                format: "time_series".to_string(),
                hide: false,
                interval: String::new(),
                interval_factor: 1,
                legend_format: String::new(),
                ref_id: self.config.ref_id.clone(),
                editor_mode: "code".to_string(),
                range: true,
                request_id: request_id.to_string(),
                utc_offset_sec: self.config.utc_offset_sec,
                datasource_id: self.config.datasource_id,
                interval_ms: self.config.interval_ms,
                max_data_points: self.config.max_data_points,
            }],
            from: window.start_millis().to_string(),
            to: window.end_millis().to_string(),
        }
    }

    /// Run one range query and decode the raw response
    pub async fn query(&self, expression: &str, window: TimeWindow) -> QueryResult<QueryResponse> {
        let request_id = uuid::Uuid::new_v4().simple().to_string();
        let url = format!("{}/api/ds/query", self.config.base_url.trim_end_matches('/'));
        let body = self.build_request(expression, window, &request_id);

        tracing::debug!(request_id = %request_id, expr = %expression, "Sending range query");

        let response = self
            .client
            .post(&url)
            .query(&[
                ("ds_type", self.config.datasource_type.as_str()),
                ("requestId", request_id.as_str()),
            ])
            .json(&body)
            .send()
            .await
            .map_err(|e| QueryError::failed(expression, self.describe_transport_error(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| QueryError::failed(expression, format!("error reading response: {}", e)))?;

        if !status.is_success() {
            return Err(QueryError::failed(
                expression,
                format!("error from server ({}): {}", status, truncate(&text)),
            ));
        }

        let decoded: QueryResponse = serde_json::from_str(&text)
            .map_err(|e| QueryError::malformed(expression, format!("invalid JSON: {}", e)))?;

        if let Some(error) = decoded
            .results
            .get(&self.config.ref_id)
            .and_then(|entry| entry.error.as_deref())
        {
            return Err(QueryError::failed(expression, format!("datasource error: {}", error)));
        }

        Ok(decoded)
    }

    fn describe_transport_error(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("request timed out after {}s", self.config.timeout_secs)
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            format!("error making request: {}", err)
        }
    }
}

#[async_trait]
impl TimeSeriesSource for GrafanaClient {
    async fn fetch(&self, expression: &str, window: TimeWindow) -> QueryResult<SampleSeries> {
        let response = self.query(expression, window).await?;
        let samples = response
            .extract_samples(&self.config.ref_id, self.config.value_column)
            .map_err(|reason| QueryError::malformed(expression, reason))?;
        Ok(SampleSeries::new(samples))
    }
}

fn default_headers(config: &GrafanaConfig, token: &str) -> QueryResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));

    let mut pairs: Vec<(&str, String)> = vec![
        ("x-grafana-org-id", config.org_id.to_string()),
        ("x-plugin-id", config.plugin_id.clone()),
        ("x-datasource-uid", config.datasource_uid.clone()),
    ];
    if let Some(dashboard_uid) = &config.dashboard_uid {
        pairs.push(("x-dashboard-uid", dashboard_uid.clone()));
    }
    for (name, value) in &config.headers {
        pairs.push((name.as_str(), value.clone()));
    }

    for (name, value) in pairs {
        let (name, value) = header_pair(name, &value)?;
        headers.insert(name, value);
    }

    let (name, mut value) = header_pair(&config.credential_header, token)?;
    value.set_sensitive(true);
    headers.insert(name, value);

    Ok(headers)
}

fn header_pair(name: &str, value: &str) -> QueryResult<(HeaderName, HeaderValue)> {
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| QueryError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    let header_value = HeaderValue::from_str(value).map_err(|e| QueryError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok((header_name, header_value))
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_BODY_CHARS {
        return text.to_string();
    }
    let mut short: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> GrafanaConfig {
        GrafanaConfig {
            base_url: base_url.to_string(),
            datasource_uid: "000000002".to_string(),
            dashboard_uid: Some("E2KboMgBY".to_string()),
            ref_id: "C".to_string(),
            timeout_secs: 1,
            ..GrafanaConfig::default()
        }
    }

    fn window() -> TimeWindow {
        TimeWindow::new(1_633_046_400_000, 1_633_132_800_000).unwrap()
    }

    fn frames_body(values: serde_json::Value) -> serde_json::Value {
        json!({
            "results": {
                "C": {
                    "status": 200,
                    "frames": [{"data": {"values": [[1, 2, 3], values]}}]
                }
            }
        })
    }

    #[test]
    fn test_default_config() {
        let config = GrafanaConfig::default();
        assert_eq!(config.interval_ms, 60_000);
        assert_eq!(config.max_data_points, 1320);
        assert_eq!(config.value_column, 1);
        assert_eq!(config.credential_header, "cookie");
    }

    #[test]
    fn test_build_request() {
        let client = GrafanaClient::new(test_config("http://localhost"), "session=abc").unwrap();
        let request = client.build_request("up", window(), "req-1");

        assert_eq!(request.from, "1633046400000");
        assert_eq!(request.to, "1633132800000");
        assert_eq!(request.queries.len(), 1);

        let query = &request.queries[0];
        assert_eq!(query.expr, "up");
        assert_eq!(query.ref_id, "C");
        assert_eq!(query.datasource.uid, "000000002");
        assert_eq!(query.request_id, "req-1");
        assert!(query.range);
    }

    #[test]
    fn test_invalid_header_rejected_at_construction() {
        let mut config = test_config("http://localhost");
        config.headers.insert("bad header".to_string(), "x".to_string());

        let err = GrafanaClient::new(config, "token").unwrap_err();
        assert!(matches!(err, QueryError::InvalidHeader { .. }));
    }

    #[test]
    fn test_truncate_long_bodies() {
        let long = "x".repeat(MAX_ERROR_BODY_CHARS + 10);
        assert_eq!(truncate(&long).len(), MAX_ERROR_BODY_CHARS + 3);
        assert_eq!(truncate("short"), "short");
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/ds/query"))
            .and(query_param("ds_type", "prometheus"))
            .and(header("cookie", "session=abc"))
            .and(header("x-grafana-org-id", "1"))
            .and(header("x-datasource-uid", "000000002"))
            .and(header("x-dashboard-uid", "E2KboMgBY"))
            .and(body_partial_json(json!({
                "from": "1633046400000",
                "to": "1633132800000",
                "queries": [{"expr": "up", "refId": "C", "range": true}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(frames_body(json!([10.0, 20.0, 5.0]))))
            .expect(1)
            .mount(&server)
            .await;

        let client = GrafanaClient::new(test_config(&server.uri()), "session=abc").unwrap();
        let series = client.fetch("up", window()).await.unwrap();

        assert_eq!(series.as_slice(), &[10.0, 20.0, 5.0]);
    }

    #[tokio::test]
    async fn test_non_success_status_is_query_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
            .mount(&server)
            .await;

        let client = GrafanaClient::new(test_config(&server.uri()), "expired").unwrap();
        let err = client.fetch("up", window()).await.unwrap_err();

        match err {
            QueryError::Failed { expression, reason } => {
                assert_eq!(expression, "up");
                assert!(reason.contains("401"));
                assert!(reason.contains("unauthorized"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_datasource_error_is_query_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": {"C": {"status": 400, "error": "parse error at char 3", "frames": []}}
            })))
            .mount(&server)
            .await;

        let client = GrafanaClient::new(test_config(&server.uri()), "t").unwrap();
        let err = client.fetch("up{", window()).await.unwrap_err();
        assert!(matches!(err, QueryError::Failed { .. }));
        assert!(err.to_string().contains("parse error"));
    }

    #[tokio::test]
    async fn test_null_sample_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(frames_body(json!([1.0, null, 3.0]))))
            .mount(&server)
            .await;

        let client = GrafanaClient::new(test_config(&server.uri()), "t").unwrap();
        let err = client.fetch("up", window()).await.unwrap_err();
        assert!(matches!(err, QueryError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_invalid_json_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
            .mount(&server)
            .await;

        let client = GrafanaClient::new(test_config(&server.uri()), "t").unwrap();
        let err = client.fetch("up", window()).await.unwrap_err();
        assert!(matches!(err, QueryError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_query_failed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(frames_body(json!([1.0])))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = GrafanaClient::new(test_config(&server.uri()), "t").unwrap();
        let err = client.fetch("up", window()).await.unwrap_err();

        match err {
            QueryError::Failed { reason, .. } => assert!(reason.contains("timed out"), "{reason}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_query_failed() {
        let client = GrafanaClient::new(test_config("http://127.0.0.1:1"), "t").unwrap();
        let err = client.fetch("up", window()).await.unwrap_err();
        assert!(matches!(err, QueryError::Failed { .. }));
    }
}
