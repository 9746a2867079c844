use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tuning knobs for duplicate resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DedupConfig {
    /// Minimum oracle confidence (inclusive, 0–100) for a match to count.
    pub confidence_threshold: u8,
    /// Most recent reports compared through the oracle.
    pub candidate_window: usize,
    /// Compare fingerprints before calling the oracle.
    pub fingerprint_fast_path: bool,
    /// Also look the fingerprint up across all stored reports, not only the window.
    pub global_fingerprint_lookup: bool,
    /// Only consider reports that are still open.
    pub open_only: bool,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 70,
            candidate_window: 20,
            fingerprint_fast_path: true,
            global_fingerprint_lookup: true,
            open_only: true,
        }
    }
}

/// Invalid [`DedupConfig`] values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DedupConfigError {
    #[error("confidence_threshold must be within 0..=100, got {0}")]
    InvalidThreshold(u8),
    #[error("candidate_window must be at least 1")]
    EmptyWindow,
}

impl DedupConfig {
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.candidate_window = window;
        self
    }

    pub fn validate(&self) -> Result<(), DedupConfigError> {
        if self.confidence_threshold > 100 {
            return Err(DedupConfigError::InvalidThreshold(self.confidence_threshold));
        }
        if self.candidate_window == 0 {
            return Err(DedupConfigError::EmptyWindow);
        }
        Ok(())
    }
}
