//! Per-attempt state machine.
//!
//! ```text
//! CAPTURED ─▶ DUPLICATE_CHECK ─┬─▶ DUPLICATE_WARNING ──proceed_anyway──┐
//!                              │                                      ▼
//!                              └─────────────────────────────────▶ CLASSIFYING
//!                                                                     │
//!                 CAPTURED ◀── CLASSIFICATION_FAILED ◀────────────────┤
//!                                                                     ▼
//!                                       SUBMITTED ◀── SUBMITTING ◀── DETAILS_READY
//!                                                        │
//!                                                        ▼
//!                                                   SUBMIT_FAILED ──▶ (retry from CAPTURED)
//! ```
use dedup::DuplicateVerdict;
use ingest::{Fingerprint, GeoPoint, Report, UploadedImage};
use oracle::ClassificationResult;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PipelineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionState {
    Captured,
    DuplicateCheck,
    DuplicateWarning,
    Classifying,
    DetailsReady,
    ClassificationFailed,
    Submitting,
    Submitted,
    SubmitFailed,
}

impl SubmissionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionState::Captured => "CAPTURED",
            SubmissionState::DuplicateCheck => "DUPLICATE_CHECK",
            SubmissionState::DuplicateWarning => "DUPLICATE_WARNING",
            SubmissionState::Classifying => "CLASSIFYING",
            SubmissionState::DetailsReady => "DETAILS_READY",
            SubmissionState::ClassificationFailed => "CLASSIFICATION_FAILED",
            SubmissionState::Submitting => "SUBMITTING",
            SubmissionState::Submitted => "SUBMITTED",
            SubmissionState::SubmitFailed => "SUBMIT_FAILED",
        }
    }

    /// States from which a fresh analysis may start.
    pub fn can_analyze(&self) -> bool {
        matches!(
            self,
            SubmissionState::Captured
                | SubmissionState::ClassificationFailed
                | SubmissionState::SubmitFailed
        )
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's attempt at filing a report.
///
/// Holds the captured photo and everything learned about it so far. The
/// photo is kept across failures, so a failed classification or save can be
/// retried without capturing again.
#[derive(Debug, Clone)]
pub struct Submission {
    image: UploadedImage,
    fingerprint: Fingerprint,
    location: Option<GeoPoint>,
    state: SubmissionState,
    history: Vec<SubmissionState>,
    duplicate: Option<DuplicateVerdict>,
    proceeded_past_warning: bool,
    classification: Option<ClassificationResult>,
    description: Option<String>,
    last_error: Option<String>,
    report: Option<Report>,
}

impl Submission {
    pub(crate) fn new(image: UploadedImage, location: Option<GeoPoint>) -> Self {
        let fingerprint = image.fingerprint();
        Self {
            image,
            fingerprint,
            location,
            state: SubmissionState::Captured,
            history: vec![SubmissionState::Captured],
            duplicate: None,
            proceeded_past_warning: false,
            classification: None,
            description: None,
            last_error: None,
            report: None,
        }
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Every state entered so far, in order.
    pub fn history(&self) -> &[SubmissionState] {
        &self.history
    }

    pub fn image(&self) -> &UploadedImage {
        &self.image
    }

    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    pub fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    /// Record the resolved geolocation. May arrive at any point before submit.
    pub fn set_location(&mut self, location: GeoPoint) {
        self.location = Some(location);
    }

    pub fn duplicate(&self) -> Option<&DuplicateVerdict> {
        self.duplicate.as_ref()
    }

    pub fn proceeded_past_warning(&self) -> bool {
        self.proceeded_past_warning
    }

    pub fn classification(&self) -> Option<&ClassificationResult> {
        self.classification.as_ref()
    }

    /// The description that will be stored: the user's edit if any, else the
    /// oracle's.
    pub fn description(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or_else(|| self.classification.as_ref().map(|c| c.description.as_str()))
    }

    /// Reason of the most recent failure, verbatim.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn report(&self) -> Option<&Report> {
        self.report.as_ref()
    }

    /// Replace the description. Only allowed once details are ready;
    /// category and severity are not editable.
    pub fn edit_description(&mut self, text: impl Into<String>) -> Result<(), PipelineError> {
        self.expect(SubmissionState::DetailsReady, "edit the description")?;
        self.description = Some(text.into());
        Ok(())
    }

    pub(crate) fn expect(
        &self,
        state: SubmissionState,
        operation: &'static str,
    ) -> Result<(), PipelineError> {
        if self.state == state {
            Ok(())
        } else {
            Err(PipelineError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    pub(crate) fn transition(&mut self, next: SubmissionState) {
        self.state = next;
        self.history.push(next);
    }

    /// Back to `CAPTURED` for a fresh analysis, keeping the photo and location.
    pub(crate) fn restart(&mut self) {
        self.duplicate = None;
        self.proceeded_past_warning = false;
        self.classification = None;
        self.description = None;
        self.report = None;
        if self.state != SubmissionState::Captured {
            self.transition(SubmissionState::Captured);
        }
    }

    pub(crate) fn warn_duplicate(&mut self, verdict: DuplicateVerdict) {
        self.duplicate = Some(verdict);
        self.transition(SubmissionState::DuplicateWarning);
    }

    pub(crate) fn mark_proceeded(&mut self) {
        self.proceeded_past_warning = true;
    }

    pub(crate) fn details_ready(&mut self, result: ClassificationResult) {
        self.classification = Some(result);
        self.last_error = None;
        self.transition(SubmissionState::DetailsReady);
    }

    /// Record a classification failure and fall back to `CAPTURED`.
    pub(crate) fn classification_failed(&mut self, reason: String) {
        self.last_error = Some(reason);
        self.transition(SubmissionState::ClassificationFailed);
        self.transition(SubmissionState::Captured);
    }

    pub(crate) fn submitted(&mut self, report: Report) {
        self.report = Some(report);
        self.last_error = None;
        self.transition(SubmissionState::Submitted);
    }

    pub(crate) fn submit_failed(&mut self, reason: String) {
        self.last_error = Some(reason);
        self.transition(SubmissionState::SubmitFailed);
    }
}
