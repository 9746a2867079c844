//! Configuration types for submission validation.
//!
//! [`IngestConfig`] controls which uploads are accepted before any external
//! service is contacted. It is cheap to clone and deserializes from the
//! pipeline YAML file.
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig::default();
//! config.validate().expect("default config is valid");
//! assert_eq!(config.max_image_bytes, Some(10 * 1024 * 1024));
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runtime configuration for image intake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    /// Configuration schema version.
    pub version: u32,

    /// Maximum accepted image size in bytes. `None` disables the check.
    ///
    /// Default: 10 MiB
    pub max_image_bytes: Option<usize>,

    /// Declared MIME types must start with this prefix.
    ///
    /// Default: `"image/"`
    pub accepted_mime_prefix: String,

    /// MIME type assumed when the client declares none.
    ///
    /// Default: `"image/jpeg"`
    pub default_mime_type: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            version: 1,
            max_image_bytes: Some(10 * 1024 * 1024),
            accepted_mime_prefix: "image/".to_string(),
            default_mime_type: "image/jpeg".to_string(),
        }
    }
}

impl IngestConfig {
    /// Validate the configuration. Call once at start-up.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 {
            return Err(ConfigError::InvalidVersion);
        }
        if matches!(self.max_image_bytes, Some(0)) {
            return Err(ConfigError::InvalidLimit(
                "max_image_bytes must be greater than zero".into(),
            ));
        }
        if !self
            .default_mime_type
            .starts_with(self.accepted_mime_prefix.as_str())
        {
            return Err(ConfigError::InvalidMime(format!(
                "default_mime_type '{}' does not match accepted prefix '{}'",
                self.default_mime_type, self.accepted_mime_prefix
            )));
        }
        Ok(())
    }
}

/// Errors raised by [`IngestConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("config version must be at least 1")]
    InvalidVersion,
    #[error("invalid size limit: {0}")]
    InvalidLimit(String),
    #[error("invalid mime configuration: {0}")]
    InvalidMime(String),
}
