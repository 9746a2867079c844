use ingest::ReportSummary;
use oracle::SimilarityVerdict;
use serde::{Deserialize, Serialize};

/// How a duplicate was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Fingerprint,
    Oracle,
}

/// Outcome of duplicate resolution for one new image.
///
/// `confidence` is `None` for fingerprint matches, which are treated as
/// certain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateVerdict {
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_report: Option<ReportSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_by: Option<MatchKind>,
}

pub const FINGERPRINT_MATCH_REASON: &str = "exact fingerprint match";

impl DuplicateVerdict {
    pub fn unique() -> Self {
        Self {
            is_duplicate: false,
            matched_report: None,
            confidence: None,
            reason: None,
            matched_by: None,
        }
    }

    pub fn fingerprint_match(report: ReportSummary) -> Self {
        Self {
            is_duplicate: true,
            matched_report: Some(report),
            confidence: None,
            reason: Some(FINGERPRINT_MATCH_REASON.to_string()),
            matched_by: Some(MatchKind::Fingerprint),
        }
    }

    pub fn oracle_match(report: ReportSummary, verdict: SimilarityVerdict) -> Self {
        Self {
            is_duplicate: true,
            matched_report: Some(report),
            confidence: Some(verdict.confidence),
            reason: Some(verdict.reason),
            matched_by: Some(MatchKind::Oracle),
        }
    }
}

/// A verdict together with what it cost to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub verdict: DuplicateVerdict,
    /// Similarity oracle calls made, failed ones included.
    pub oracle_calls: usize,
    /// Candidates skipped because their comparison failed.
    pub comparison_failures: usize,
}
