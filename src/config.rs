//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Precedence, lowest first: built-in defaults, TOML file, `PULSE_*`
//! environment variables, command-line flags (applied by the binary).

use crate::catalog::ApprovalPolicy;
use crate::query::GrafanaConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub grafana: GrafanaConfig,

    #[serde(default)]
    pub evaluation: EvaluationConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Evaluation run configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluationConfig {
    /// Maximum number of queries in flight
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Deadline for the whole run, in seconds
    #[serde(default)]
    pub run_deadline_secs: Option<u64>,

    /// How the catalog's `Approved` column is interpreted
    #[serde(default)]
    pub approval_policy: ApprovalPolicy,
}

fn default_concurrency() -> usize {
    1
}

impl EvaluationConfig {
    pub fn run_deadline(&self) -> Option<Duration> {
        self.run_deadline_secs.map(Duration::from_secs)
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            run_deadline_secs: None,
            approval_policy: ApprovalPolicy::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// The first existing default file is used. A file that exists but
    /// cannot be read or parsed is an error rather than being skipped.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load_first_existing(&Self::default_paths())
    }

    fn load_first_existing(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        match paths.iter().find(|path| path.exists()) {
            Some(path) => {
                let config = Self::load_with_env(path)?;
                tracing::debug!("Loaded config from {:?}", path);
                Ok(config)
            }
            None => Self::from_env(),
        }
    }

    /// Candidate config file locations, in lookup order
    pub fn default_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("opex-pulse").join("config.toml")),
            Some(PathBuf::from("./pulse.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    /// Apply `PULSE_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Grafana overrides
        if let Some(url) = lookup("PULSE_GRAFANA_URL") {
            self.grafana.base_url = url;
        }
        if let Some(timeout) = lookup("PULSE_TIMEOUT_SECS") {
            self.grafana.timeout_secs = parse_env("PULSE_TIMEOUT_SECS", &timeout)?;
        }

        // Evaluation overrides
        if let Some(concurrency) = lookup("PULSE_CONCURRENCY") {
            self.evaluation.concurrency = parse_env("PULSE_CONCURRENCY", &concurrency)?;
        }

        // Logging overrides
        if let Some(level) = lookup("PULSE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("PULSE_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Env {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid value for {key}: {value:?}")]
    Env { key: String, value: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# opex-pulse Configuration
#
# Environment variables override these settings:
# - PULSE_GRAFANA_URL
# - PULSE_TIMEOUT_SECS
# - PULSE_CONCURRENCY
# - PULSE_LOG_LEVEL
# - PULSE_LOG_FORMAT

[grafana]
# Grafana base URL
base_url = "http://localhost:3000"

# Organisation sent as x-grafana-org-id
org_id = 1

# Datasource plugin and identity
plugin_id = "prometheus"
datasource_type = "prometheus"
datasource_uid = "prometheus"
datasource_id = 1

# Optional dashboard sent as x-dashboard-uid
# dashboard_uid = "abcdef"

# Query shape
ref_id = "A"
interval_ms = 60000
max_data_points = 1320
utc_offset_sec = 0
exemplar = false

# Frame column holding the sample values (column 0 is time)
value_column = 1

# Per-request timeout in seconds
timeout_secs = 30

# Header carrying the credential file contents
credential_header = "cookie"

# Extra headers sent with every request
# [grafana.headers]
# x-custom = "value"

[evaluation]
# Maximum number of queries in flight (1 = sequential)
concurrency = 1

# Deadline for the whole run in seconds
# run_deadline_secs = 300

# Approved column handling: assume_approved or trust_catalog
approval_policy = "assume_approved"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_parses() {
        let config = Config::parse(&generate_default_config()).unwrap();

        assert_eq!(config.grafana.base_url, "http://localhost:3000");
        assert_eq!(config.grafana.timeout_secs, 30);
        assert_eq!(config.grafana.credential_header, "cookie");
        assert_eq!(config.evaluation.concurrency, 1);
        assert_eq!(config.evaluation.run_deadline(), None);
        assert_eq!(config.evaluation.approval_policy, ApprovalPolicy::AssumeApproved);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::parse(
            r#"
[grafana]
base_url = "https://grafana.example.com"
datasource_uid = "abc123"

[evaluation]
concurrency = 4
run_deadline_secs = 120
approval_policy = "trust_catalog"
"#,
        )
        .unwrap();

        assert_eq!(config.grafana.base_url, "https://grafana.example.com");
        assert_eq!(config.grafana.datasource_uid, "abc123");
        assert_eq!(config.grafana.ref_id, "A");
        assert_eq!(config.evaluation.concurrency, 4);
        assert_eq!(config.evaluation.run_deadline(), Some(Duration::from_secs(120)));
        assert_eq!(config.evaluation.approval_policy, ApprovalPolicy::TrustCatalog);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pulse.toml");
        std::fs::write(&path, "[evaluation]\nconcurrency = \"many\"\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_first_existing_default_is_used() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.toml");
        let present = dir.path().join("pulse.toml");
        std::fs::write(&present, "[evaluation]\nconcurrency = 3\n").unwrap();

        let config = Config::load_first_existing(&[missing, present]).unwrap();
        assert_eq!(config.evaluation.concurrency, 3);
    }

    #[test]
    fn test_malformed_default_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let broken = dir.path().join("pulse.toml");
        std::fs::write(&broken, "[grafana\nbase_url = \"https://grafana.example.com\"\n").unwrap();
        let fallback = dir.path().join("other.toml");
        std::fs::write(&fallback, "[evaluation]\nconcurrency = 3\n").unwrap();

        let err = Config::load_first_existing(&[broken.clone(), fallback]).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, broken),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_no_default_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_first_existing(&[dir.path().join("missing.toml")]).unwrap();
        assert_eq!(config.grafana.ref_id, "A");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PULSE_GRAFANA_URL", "https://grafana.internal"),
            ("PULSE_TIMEOUT_SECS", "5"),
            ("PULSE_CONCURRENCY", " 4 "),
            ("PULSE_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides_from(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.grafana.base_url, "https://grafana.internal");
        assert_eq!(config.grafana.timeout_secs, 5);
        assert_eq!(config.evaluation.concurrency, 4);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_env_value_is_an_error() {
        let mut config = Config::default();
        let err = config
            .apply_overrides_from(|key| (key == "PULSE_CONCURRENCY").then(|| "many".to_string()))
            .unwrap_err();

        match err {
            ConfigError::Env { key, value } => {
                assert_eq!(key, "PULSE_CONCURRENCY");
                assert_eq!(value, "many");
            }
            other => panic!("expected env error, got {other:?}"),
        }
        assert_eq!(config.evaluation.concurrency, 1);
    }
}
