use crate::error::ServerResult;
use crate::state::ServerState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub original: String,
    pub translated: String,
}

/// `POST /api/v1/translate`
///
/// Never fails on the oracle side; the input comes back unchanged instead.
pub async fn translate(
    State(state): State<Arc<ServerState>>,
    Json(body): Json<TranslateRequest>,
) -> ServerResult<Json<TranslateResponse>> {
    let translated = state.coordinator.translate(&body.text).await;
    Ok(Json(TranslateResponse {
        original: body.text,
        translated,
    }))
}
