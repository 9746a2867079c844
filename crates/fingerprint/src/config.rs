//! Configuration and error types for image content fingerprinting.
//!
//! The fingerprint is a pure function of `(bytes, config)`. Nothing in this
//! module touches I/O, clocks, or process state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sampling parameters for the coarse content signature.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FingerprintConfig {
    /// Configuration schema version.
    ///
    /// Any change that can alter produced fingerprints must bump this so that
    /// stored fingerprints from older versions are not compared against new ones.
    pub version: u32,
    /// Only bytes with an index below this limit are sampled.
    pub sample_limit: usize,
    /// Distance between two sampled bytes.
    pub step: usize,
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            version: 1,
            sample_limit: 1000,
            step: 10,
        }
    }
}

impl FingerprintConfig {
    /// Create a new configuration with the stored-fingerprint defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the upper bound (exclusive) of the sampled byte window.
    pub fn with_sample_limit(mut self, limit: usize) -> Self {
        self.sample_limit = limit;
        self
    }

    /// Set the sampling stride.
    pub fn with_step(mut self, step: usize) -> Self {
        self.step = step;
        self
    }

    /// Validate the configuration before use.
    pub fn validate(&self) -> Result<(), FingerprintError> {
        if self.step == 0 {
            return Err(FingerprintError::InvalidStep);
        }
        if self.sample_limit == 0 {
            return Err(FingerprintError::InvalidSampleLimit);
        }
        Ok(())
    }
}

/// Errors raised for unusable fingerprint configurations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("fingerprint step must be greater than zero")]
    InvalidStep,
    #[error("fingerprint sample limit must be greater than zero")]
    InvalidSampleLimit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stored_fingerprints() {
        let cfg = FingerprintConfig::default();
        assert_eq!(cfg.sample_limit, 1000);
        assert_eq!(cfg.step, 10);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_step_is_rejected() {
        let cfg = FingerprintConfig::new().with_step(0);
        assert_eq!(cfg.validate(), Err(FingerprintError::InvalidStep));
    }

    #[test]
    fn zero_sample_limit_is_rejected() {
        let cfg = FingerprintConfig::new().with_sample_limit(0);
        assert_eq!(cfg.validate(), Err(FingerprintError::InvalidSampleLimit));
    }

    #[test]
    fn partial_yaml_style_config_uses_defaults() {
        let cfg: FingerprintConfig = serde_json::from_str(r#"{"step": 4}"#).unwrap();
        assert_eq!(cfg.step, 4);
        assert_eq!(cfg.sample_limit, 1000);
    }
}
