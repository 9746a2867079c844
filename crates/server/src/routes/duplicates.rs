use crate::error::ServerResult;
use crate::routes::ImagePayload;
use crate::state::ServerState;
use axum::extract::State;
use axum::Json;
use dhaal::DuplicateVerdict;
use std::sync::Arc;

/// `POST /api/v1/duplicates/check`
///
/// Verdict only. Store or oracle trouble yields "not a duplicate".
pub async fn check_duplicates(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<ImagePayload>,
) -> ServerResult<Json<DuplicateVerdict>> {
    let image = body.decode(state.coordinator.ingest_config())?;
    Ok(Json(state.coordinator.check_duplicates(&image).await))
}
