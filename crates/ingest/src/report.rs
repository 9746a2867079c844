//! The durable report entity and the read-only views of it used during
//! duplicate resolution.
use chrono::{DateTime, Utc};
use fingerprint::Fingerprint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{GeoPoint, ImageRef};
use crate::IngestError;

/// Lowest and highest severity scores.
pub const MIN_SEVERITY: u8 = 1;
pub const MAX_SEVERITY: u8 = 10;

/// Severity at or above which a report is an emergency.
pub const EMERGENCY_SEVERITY: u8 = 9;

/// Clamp an arbitrary score into the 1–10 severity range.
pub fn clamp_severity(score: i64) -> u8 {
    score.clamp(MIN_SEVERITY as i64, MAX_SEVERITY as i64) as u8
}

/// Identifier of a persisted report.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportId(String);

impl ReportId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Fresh random identifier for a report about to be created.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ReportId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Triage status. Only `Open` is ever written by the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Open => "OPEN",
            ReportStatus::InProgress => "IN_PROGRESS",
            ReportStatus::Resolved => "RESOLVED",
        }
    }
}

impl fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatus {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(ReportStatus::Open),
            "IN_PROGRESS" => Ok(ReportStatus::InProgress),
            "RESOLVED" => Ok(ReportStatus::Resolved),
            other => Err(IngestError::InvalidField(format!("unknown status '{other}'"))),
        }
    }
}

/// Triage priority. Always derived from severity, never taken from the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Normal,
    High,
    #[serde(alias = "URGENT")]
    Critical,
}

impl Priority {
    /// 9–10 critical, 7–8 high, 4–6 normal, 1–3 low.
    pub fn from_severity(severity: u8) -> Self {
        match severity {
            9..=u8::MAX => Priority::Critical,
            7..=8 => Priority::High,
            4..=6 => Priority::Normal,
            _ => Priority::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Normal => "NORMAL",
            Priority::High => "HIGH",
            Priority::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Priority::Low),
            "NORMAL" | "MEDIUM" => Ok(Priority::Normal),
            "HIGH" => Ok(Priority::High),
            "CRITICAL" | "URGENT" => Ok(Priority::Critical),
            other => Err(IngestError::InvalidField(format!("unknown priority '{other}'"))),
        }
    }
}

/// A persisted civic issue report.
///
/// Built exactly once by the ingestion coordinator; afterwards only the
/// officer triage workflow mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: ReportId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub category: String,
    pub severity: u8,
    pub description: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(rename = "image_url")]
    pub image: ImageRef,
    #[serde(rename = "image_hash")]
    pub fingerprint: Fingerprint,
    pub status: ReportStatus,
    pub priority: Priority,
    #[serde(default)]
    pub upvotes: u32,
    pub created_at: DateTime<Utc>,
}

impl Report {
    pub fn location(&self) -> GeoPoint {
        GeoPoint {
            lat: self.lat,
            lng: self.lng,
        }
    }

    pub fn is_emergency(&self) -> bool {
        self.severity >= EMERGENCY_SEVERITY
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            id: self.id.clone(),
            category: self.category.clone(),
            severity: self.severity,
            status: self.status,
            created_at: self.created_at,
        }
    }

    /// Read-only view handed to the duplicate resolver.
    pub fn to_existing(&self) -> ExistingReport {
        ExistingReport {
            summary: self.summary(),
            fingerprint: (!self.fingerprint.is_empty()).then(|| self.fingerprint.clone()),
            image: self.image.clone(),
        }
    }
}

/// Short description of a report, shown to the user on a duplicate warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub id: ReportId,
    pub category: String,
    pub severity: u8,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

/// A recent report considered as a duplicate candidate.
///
/// Older rows may have been written without a fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingReport {
    pub summary: ReportSummary,
    pub fingerprint: Option<Fingerprint>,
    pub image: ImageRef,
}
