//! YAML configuration for the ingestion pipeline.
//!
//! Every section is optional; omitted sections take their defaults. Secrets
//! can be left out of the file and supplied through the environment.
//!
//! ```yaml
//! version: "1.0"
//! name: "dhaal-dev"
//!
//! ingest:
//!   max_image_bytes: 10485760
//!   accepted_mime_prefix: "image/"
//!
//! oracle:
//!   mode: "stub"            # or "api"
//!   model_name: "gemini-2.5-flash"
//!   api_timeout_secs: 60
//!   retry:
//!     max_attempts: 3
//!     rate_limited_step: 15000
//!     transient_step: 3000
//!
//! dedup:
//!   confidence_threshold: 70
//!   candidate_window: 20
//!
//! store:
//!   mode: "memory"          # or "rest"
//!   base_url: "https://project.supabase.co"
//!   reports_table: "reports"
//!   image_bucket: "report-images"
//! ```

use std::fs;
use std::path::Path;

use dedup::DedupConfig;
use ingest::IngestConfig;
use oracle::OracleConfig;
use serde::{Deserialize, Serialize};
use store::StoreConfig;
use thiserror::Error;
use tracing::debug;

/// Environment variable holding the vision model API key.
pub const ORACLE_API_KEY_ENV: &str = "DHAAL_ORACLE_API_KEY";
/// Environment variable holding the storage service key.
pub const STORE_API_KEY_ENV: &str = "DHAAL_STORE_API_KEY";

/// Errors that can occur when loading the pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DhaalConfig {
    pub version: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub oracle: OracleConfig,

    #[serde(default)]
    pub dedup: DedupConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for DhaalConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            ingest: IngestConfig::default(),
            oracle: OracleConfig::default(),
            dedup: DedupConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

impl DhaalConfig {
    /// Offline configuration: stub oracle, in-memory stores.
    pub fn offline() -> Self {
        let mut cfg = Self::default();
        cfg.oracle.mode = "stub".to_string();
        cfg.store.mode = "memory".to_string();
        cfg
    }

    /// Load a YAML file, apply environment overrides and validate.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML, apply environment overrides and validate.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        Self::from_yaml_with_env(yaml, |key| std::env::var(key).ok())
    }

    /// Like [`from_yaml`](Self::from_yaml) with a custom environment lookup.
    pub fn from_yaml_with_env<F>(yaml: &str, lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: DhaalConfig = serde_yaml::from_str(yaml)?;
        config.apply_env(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Fill secrets from the environment. Non-empty values win over the file.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ORACLE_API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(var = ORACLE_API_KEY_ENV, "config_env_override");
            self.oracle.api_key = Some(key);
        }
        if let Some(key) = lookup(STORE_API_KEY_ENV).filter(|v| !v.trim().is_empty()) {
            debug!(var = STORE_API_KEY_ENV, "config_env_override");
            self.store.api_key = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }

        self.ingest
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("ingest: {e}")))?;
        self.oracle
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("oracle: {e}")))?;
        self.dedup
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("dedup: {e}")))?;
        self.store
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("store: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn minimal_offline_config_uses_defaults() {
        let yaml = r#"
version: "1.0"
oracle:
  mode: "stub"
"#;
        let cfg = DhaalConfig::from_yaml_with_env(yaml, no_env).unwrap();
        assert!(cfg.oracle.is_stub());
        assert_eq!(cfg.dedup.confidence_threshold, 70);
        assert_eq!(cfg.dedup.candidate_window, 20);
        assert_eq!(cfg.store.mode, "memory");
        assert_eq!(cfg.oracle.retry.rate_limited_step, Duration::from_secs(15));
    }

    #[test]
    fn sections_override_defaults() {
        let yaml = r#"
version: "1"
name: "staging"
oracle:
  mode: "stub"
  retry:
    max_attempts: 5
    transient_step: 1000
dedup:
  confidence_threshold: 85
  candidate_window: 5
"#;
        let cfg = DhaalConfig::from_yaml_with_env(yaml, no_env).unwrap();
        assert_eq!(cfg.name.as_deref(), Some("staging"));
        assert_eq!(cfg.oracle.retry.max_attempts, 5);
        assert_eq!(cfg.oracle.retry.transient_step, Duration::from_secs(1));
        assert_eq!(cfg.oracle.retry.rate_limited_step, Duration::from_secs(15));
        assert_eq!(cfg.dedup.confidence_threshold, 85);
        assert_eq!(cfg.dedup.candidate_window, 5);
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let err = DhaalConfig::from_yaml_with_env("version: \"2.0\"\n", no_env).unwrap_err();
        assert!(matches!(err, ConfigLoadError::UnsupportedVersion(v) if v == "2.0"));
    }

    #[test]
    fn api_mode_without_key_fails_validation() {
        let err = DhaalConfig::from_yaml_with_env("version: \"1.0\"\n", no_env).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(msg) if msg.starts_with("oracle:")));
    }

    #[test]
    fn environment_supplies_secrets() {
        let yaml = r#"
version: "1.0"
store:
  mode: "rest"
  base_url: "https://project.supabase.co"
"#;
        let cfg = DhaalConfig::from_yaml_with_env(yaml, |key| match key {
            ORACLE_API_KEY_ENV => Some("model-key".to_string()),
            STORE_API_KEY_ENV => Some("service-key".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(cfg.oracle.api_key.as_deref(), Some("model-key"));
        assert_eq!(cfg.store.api_key.as_deref(), Some("service-key"));
    }

    #[test]
    fn blank_environment_values_are_ignored() {
        let yaml = r#"
version: "1.0"
oracle:
  mode: "stub"
  api_key: "from-file"
"#;
        let cfg = DhaalConfig::from_yaml_with_env(yaml, |_| Some("  ".to_string())).unwrap();
        assert_eq!(cfg.oracle.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn empty_candidate_window_is_a_validation_error() {
        let yaml = r#"
version: "1.0"
oracle:
  mode: "stub"
dedup:
  candidate_window: 0
"#;
        let err = DhaalConfig::from_yaml_with_env(yaml, no_env).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Validation(msg) if msg.starts_with("dedup:")));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "version: \"1.0\"\noracle:\n  mode: stub\n").unwrap();
        let cfg = DhaalConfig::from_file(file.path()).unwrap();
        assert!(cfg.oracle.is_stub());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = DhaalConfig::from_file("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileRead(_)));
    }

    #[test]
    fn offline_config_validates() {
        DhaalConfig::offline().validate().unwrap();
    }
}
