use ingest::IngestError;
use oracle::OracleError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use store::StoreError;

use crate::submission::SubmissionState;

/// User-facing result of one submission attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeCode {
    /// A duplicate was found and the user did not choose to proceed.
    DuplicateBlocked,
    /// A duplicate was found, the user proceeded and the report was saved.
    DuplicateWarnedProceed,
    ClassificationFailed,
    LocationMissing,
    StoreFailed,
    SubmittedOk,
}

impl OutcomeCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeCode::DuplicateBlocked => "DUPLICATE_BLOCKED",
            OutcomeCode::DuplicateWarnedProceed => "DUPLICATE_WARNED_PROCEED",
            OutcomeCode::ClassificationFailed => "CLASSIFICATION_FAILED",
            OutcomeCode::LocationMissing => "LOCATION_MISSING",
            OutcomeCode::StoreFailed => "STORE_FAILED",
            OutcomeCode::SubmittedOk => "SUBMITTED_OK",
        }
    }

    /// Whether a report was persisted.
    pub fn is_persisted(&self) -> bool {
        matches!(
            self,
            OutcomeCode::SubmittedOk | OutcomeCode::DuplicateWarnedProceed
        )
    }
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that end a submission attempt.
#[derive(Debug)]
pub enum PipelineError {
    /// No valid geolocation. Raised before any external call.
    LocationMissing,
    /// Classification exhausted its retries (or the answer never parsed).
    Classification(OracleError),
    /// The report could not be persisted.
    Store(StoreError),
    /// The image failed the intake policy.
    InvalidImage(IngestError),
    /// An operation was invoked in a state that does not allow it.
    InvalidState {
        operation: &'static str,
        state: SubmissionState,
    },
}

impl PipelineError {
    /// Outcome code reported to the user for this failure, if it has one.
    pub fn outcome_code(&self) -> Option<OutcomeCode> {
        match self {
            PipelineError::LocationMissing => Some(OutcomeCode::LocationMissing),
            PipelineError::Classification(_) => Some(OutcomeCode::ClassificationFailed),
            PipelineError::Store(_) => Some(OutcomeCode::StoreFailed),
            PipelineError::InvalidImage(_) | PipelineError::InvalidState { .. } => None,
        }
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::LocationMissing => {
                write!(f, "location is required to submit a report")
            }
            // Shown to the user verbatim.
            PipelineError::Classification(err) => write!(f, "{err}"),
            PipelineError::Store(err) => write!(f, "failed to save report: {err}"),
            PipelineError::InvalidImage(err) => write!(f, "invalid image: {err}"),
            PipelineError::InvalidState { operation, state } => {
                write!(f, "cannot {operation} while submission is {state}")
            }
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Classification(err) => Some(err),
            PipelineError::Store(err) => Some(err),
            PipelineError::InvalidImage(err) => Some(err),
            PipelineError::LocationMissing | PipelineError::InvalidState { .. } => None,
        }
    }
}

impl From<OracleError> for PipelineError {
    fn from(value: OracleError) -> Self {
        PipelineError::Classification(value)
    }
}

impl From<StoreError> for PipelineError {
    fn from(value: StoreError) -> Self {
        PipelineError::Store(value)
    }
}

impl From<IngestError> for PipelineError {
    fn from(value: IngestError) -> Self {
        match value {
            IngestError::InvalidLocation { .. } => PipelineError::LocationMissing,
            other => PipelineError::InvalidImage(other),
        }
    }
}
