//! API route handlers
//!
//! - `health`: liveness and readiness
//! - `reports`: analysis, submission and listing of reports
//! - `duplicates`: stand-alone duplicate check
//! - `translate`: description translation

pub mod duplicates;
pub mod health;
pub mod reports;
pub mod translate;

use crate::error::{ServerError, ServerResult};
use axum::response::IntoResponse;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dhaal::{accept_image, GeoPoint, ImageRef, IngestConfig, PipelineError, UploadedImage};
use serde::Deserialize;
use serde_json::json;
use std::future::Future;

/// Run a pipeline attempt on its own task and wait for it.
///
/// Dropping the request (client gone, timeout) only drops this wait; the
/// attempt itself still runs to completion or failure.
pub(crate) async fn run_detached<T, F>(attempt: F) -> ServerResult<T>
where
    F: Future<Output = Result<T, PipelineError>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(attempt).await {
        Ok(result) => result.map_err(ServerError::from),
        Err(err) => Err(ServerError::Internal(format!("submission task failed: {err}"))),
    }
}

/// A photo as it travels in JSON: plain base64 or a `data:` URL.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub image: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

impl ImagePayload {
    /// Decode and validate against the intake policy.
    pub fn decode(&self, cfg: &IngestConfig) -> ServerResult<UploadedImage> {
        let raw = self.image.trim();
        if raw.starts_with("data:") {
            let inline = ImageRef::parse(raw)
                .decode_inline()
                .map_err(PipelineError::InvalidImage)?
                .ok_or_else(|| ServerError::BadRequest("unreadable data URL".into()))?;
            return Ok(accept_image(
                inline.bytes().to_vec(),
                Some(inline.mime_type()),
                cfg,
            )
            .map_err(PipelineError::InvalidImage)?);
        }

        let bytes = STANDARD
            .decode(raw)
            .map_err(|e| ServerError::BadRequest(format!("image is not valid base64: {e}")))?;
        Ok(accept_image(bytes, self.mime_type.as_deref(), cfg).map_err(PipelineError::InvalidImage)?)
    }
}

/// Both coordinates present and in range, else `None`.
pub(crate) fn location(lat: Option<f64>, lng: Option<f64>) -> Option<GeoPoint> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => GeoPoint::new(lat, lng).ok(),
        _ => None,
    }
}

/// API version and base info
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "Dhaal Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/api/v1/reports",
            "/api/v1/reports/analyze",
            "/api/v1/duplicates/check",
            "/api/v1/translate",
            "/health",
            "/ready"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
