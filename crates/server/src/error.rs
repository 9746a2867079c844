use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dhaal::{OutcomeCode, PipelineError};
use serde::{Deserialize, Serialize};
use serde_json::json;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

/// API error response structure
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

/// HTTP status for a user-facing outcome.
pub fn outcome_status(code: OutcomeCode) -> StatusCode {
    match code {
        OutcomeCode::SubmittedOk | OutcomeCode::DuplicateWarnedProceed => StatusCode::CREATED,
        OutcomeCode::DuplicateBlocked => StatusCode::CONFLICT,
        OutcomeCode::LocationMissing => StatusCode::BAD_REQUEST,
        OutcomeCode::ClassificationFailed => StatusCode::BAD_GATEWAY,
        OutcomeCode::StoreFailed => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Pipeline(err) => match (err, err.outcome_code()) {
                (_, Some(code)) => outcome_status(code),
                (PipelineError::InvalidState { .. }, None) => StatusCode::CONFLICT,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            ServerError::Internal(_) | ServerError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ServerError::BadRequest(_) => "BAD_REQUEST",
            ServerError::Pipeline(err) => match err.outcome_code() {
                Some(code) => code.as_str(),
                None if matches!(err, PipelineError::InvalidState { .. }) => "INVALID_STATE",
                None => "INVALID_IMAGE",
            },
            ServerError::Internal(_) => "INTERNAL_ERROR",
            ServerError::Config(_) => "CONFIG_ERROR",
            ServerError::NotFound => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "request_failed");
        }

        let body = Json(json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(err: serde_json::Error) -> Self {
        ServerError::BadRequest(format!("JSON parse error: {err}"))
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}
