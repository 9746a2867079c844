use ingest::{Priority, EMERGENCY_SEVERITY};
use serde::{Deserialize, Serialize};

/// What the oracle concluded about a single image.
///
/// `priority` and `is_emergency` are always recomputed from `severity_score`
/// so the three fields never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub category: String,
    pub severity_score: u8,
    pub description: String,
    pub priority: Priority,
    pub is_emergency: bool,
}

impl ClassificationResult {
    /// Build a result from a severity already clamped into 1–10.
    pub fn new(category: impl Into<String>, severity_score: u8, description: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            severity_score,
            description: description.into(),
            priority: Priority::from_severity(severity_score),
            is_emergency: severity_score >= EMERGENCY_SEVERITY,
        }
    }
}

/// Pairwise judgement: do two photos show the same physical issue?
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarityVerdict {
    pub is_same: bool,
    /// 0–100.
    pub confidence: u8,
    #[serde(default)]
    pub reason: String,
}

impl SimilarityVerdict {
    pub fn different(reason: impl Into<String>) -> Self {
        Self {
            is_same: false,
            confidence: 0,
            reason: reason.into(),
        }
    }

    /// Whether this verdict clears `threshold` (inclusive).
    pub fn is_confident_match(&self, threshold: u8) -> bool {
        self.is_same && self.confidence >= threshold
    }
}
