use ingest::{Report, ReportStatus};
use serde::{Deserialize, Serialize};

/// Narrows report queries. Every `None` field matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
    pub min_severity: Option<u8>,
    /// Case-insensitive exact category match.
    pub category: Option<String>,
}

impl ReportFilter {
    pub fn all() -> Self {
        Self::default()
    }

    /// Reports still waiting for triage.
    pub fn open() -> Self {
        Self {
            status: Some(ReportStatus::Open),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: ReportStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_min_severity(mut self, severity: u8) -> Self {
        self.min_severity = Some(severity);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn matches(&self, report: &Report) -> bool {
        self.status.map_or(true, |s| report.status == s)
            && self.min_severity.map_or(true, |m| report.severity >= m)
            && self
                .category
                .as_deref()
                .map_or(true, |c| report.category.eq_ignore_ascii_case(c))
    }
}
