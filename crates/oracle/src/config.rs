use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::retry::RetryConfig;

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Runtime configuration for the vision-language oracle.
///
/// # Example
/// ```
/// use oracle::OracleConfig;
///
/// let cfg = OracleConfig {
///     mode: "stub".into(),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OracleConfig {
    /// `"api"` calls the remote model, `"stub"` answers deterministically offline.
    pub mode: String,
    /// Base URL of the generateContent API (without the `/models/...` suffix).
    pub api_url: String,
    /// Model used for classification and comparison.
    pub model_name: String,
    /// API key, sent as the `key` query parameter. Required in api mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Overall request timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// Retry policy applied to classification calls only.
    pub retry: RetryConfig,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            mode: "api".into(),
            api_url: DEFAULT_API_URL.into(),
            model_name: DEFAULT_MODEL.into(),
            api_key: None,
            api_timeout_secs: Some(60),
            retry: RetryConfig::default(),
        }
    }
}

impl OracleConfig {
    pub fn is_stub(&self) -> bool {
        self.mode.eq_ignore_ascii_case("stub")
    }

    pub fn validate(&self) -> Result<(), OracleError> {
        match self.mode.to_ascii_lowercase().as_str() {
            "stub" => {}
            "api" => {
                if self.api_url.trim().is_empty() {
                    return Err(OracleError::InvalidConfig(
                        "api_url is required for api mode".into(),
                    ));
                }
                if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
                    return Err(OracleError::InvalidConfig(
                        "api_key is required for api mode".into(),
                    ));
                }
            }
            other => {
                return Err(OracleError::InvalidConfig(format!(
                    "unknown oracle mode '{other}' (expected 'api' or 'stub')"
                )))
            }
        }
        if self.model_name.trim().is_empty() {
            return Err(OracleError::InvalidConfig("model_name must not be empty".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(OracleError::InvalidConfig(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
