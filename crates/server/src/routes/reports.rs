use crate::error::{outcome_status, ServerError, ServerResult};
use crate::routes::{location, run_detached, ImagePayload};
use crate::state::ServerState;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dhaal::{
    ClassificationResult, DuplicateVerdict, Report, ReportFilter, ReportStatus, SubmissionRequest,
    SubmissionState,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 200;

/// Full submission: photo, position, optional edited description.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitReportRequest {
    #[serde(flatten)]
    pub image: ImagePayload,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub proceed_anyway: bool,
}

/// `POST /api/v1/reports`
///
/// 201 when a report was saved, 409 when a duplicate blocked it. Once
/// started, the attempt finishes even if the client has gone away.
pub async fn submit_report(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<SubmitReportRequest>,
) -> ServerResult<Response> {
    let coordinator = state.coordinator_for(&headers);
    let location = location(body.lat, body.lng);
    let image = match location {
        Some(_) => body.image.decode(coordinator.ingest_config())?,
        // Rejected before the photo is even decoded.
        None => return Err(dhaal::PipelineError::LocationMissing.into()),
    };

    let mut request = SubmissionRequest::new(image, location);
    request.description = body.description;
    request.proceed_anyway = body.proceed_anyway;

    let outcome = run_detached(async move { coordinator.submit_report(request).await }).await?;
    Ok((outcome_status(outcome.code), Json(outcome)).into_response())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(flatten)]
    pub image: ImagePayload,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub state: SubmissionState,
    pub fingerprint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<DuplicateVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationResult>,
}

/// `POST /api/v1/reports/analyze`
///
/// Runs the duplicate check and, if clear, classification. Nothing is stored.
/// Like submission, the analysis outlives a dropped request.
pub async fn analyze_report(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<AnalyzeRequest>,
) -> ServerResult<Json<AnalyzeResponse>> {
    let coordinator = state.coordinator_for(&headers);
    let image = body.image.decode(coordinator.ingest_config())?;

    let location = location(body.lat, body.lng);

    let (submission, state) = run_detached(async move {
        let mut submission = coordinator.capture(image, location)?;
        let state = coordinator.analyze(&mut submission).await?;
        Ok::<_, dhaal::PipelineError>((submission, state))
    })
    .await?;

    Ok(Json(AnalyzeResponse {
        state,
        fingerprint: submission.fingerprint().to_string(),
        duplicate: submission.duplicate().cloned(),
        classification: submission.classification().cloned(),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReportsQuery {
    pub limit: Option<usize>,
    pub status: Option<String>,
    pub min_severity: Option<u8>,
    pub category: Option<String>,
}

impl ListReportsQuery {
    fn filter(&self) -> ServerResult<ReportFilter> {
        let mut filter = ReportFilter::all();
        if let Some(status) = self.status.as_deref() {
            let status: ReportStatus = status
                .parse()
                .map_err(|e| ServerError::BadRequest(format!("{e}")))?;
            filter = filter.with_status(status);
        }
        if let Some(severity) = self.min_severity {
            filter = filter.with_min_severity(severity);
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.trim().is_empty()) {
            filter = filter.with_category(category);
        }
        Ok(filter)
    }
}

#[derive(Debug, Serialize)]
pub struct ListReportsResponse {
    pub count: usize,
    pub reports: Vec<Report>,
}

/// `GET /api/v1/reports`
pub async fn list_reports(
    State(state): State<Arc<ServerState>>,
    Query(query): Query<ListReportsQuery>,
) -> ServerResult<Json<ListReportsResponse>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let reports = state
        .coordinator
        .recent_reports(limit, &query.filter()?)
        .await?;

    Ok(Json(ListReportsResponse {
        count: reports.len(),
        reports,
    }))
}
