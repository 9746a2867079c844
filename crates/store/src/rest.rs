//! PostgREST tables and Supabase-style object storage.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ingest::{
    clamp_severity, Fingerprint, ImageRef, Priority, Report, ReportId, ReportStatus,
    UploadedImage,
};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::{object_name, ImageStore, ReportStore};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::filter::ReportFilter;

fn build_client(cfg: &StoreConfig) -> Result<reqwest::Client, StoreError> {
    let mut builder = reqwest::Client::builder().connect_timeout(Duration::from_secs(10));
    if let Some(secs) = cfg.timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder
        .build()
        .map_err(|e| StoreError::InvalidConfig(format!("failed to build HTTP client: {e}")))
}

fn credentials(cfg: &StoreConfig) -> Result<(String, String), StoreError> {
    let base_url = cfg
        .base_url
        .as_deref()
        .map(|u| u.trim().trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| StoreError::InvalidConfig("base_url is required for rest mode".into()))?;
    let api_key = cfg
        .api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| StoreError::InvalidConfig("api_key is required for rest mode".into()))?;
    Ok((base_url, api_key))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::Http {
            status: status.as_u16(),
            body,
        })
    }
}

/// Report table exposed through PostgREST (`/rest/v1/<table>`).
#[derive(Debug, Clone)]
pub struct RestReportStore {
    client: reqwest::Client,
    table_url: String,
    api_key: String,
}

impl RestReportStore {
    pub fn new(cfg: &StoreConfig) -> Result<Self, StoreError> {
        let (base_url, api_key) = credentials(cfg)?;
        Ok(Self {
            client: build_client(cfg)?,
            table_url: format!("{base_url}/rest/v1/{}", cfg.reports_table),
            api_key,
        })
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, &self.table_url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn select(&self, params: Vec<(&str, String)>) -> Result<Vec<Report>, StoreError> {
        let response = self
            .request(reqwest::Method::GET)
            .query(&params)
            .send()
            .await?;
        let rows: Vec<ReportRow> = check_status(response).await?.json().await?;
        Ok(rows.into_iter().filter_map(ReportRow::into_report).collect())
    }
}

/// PostgREST query parameters for `filter`.
pub(crate) fn filter_params(filter: &ReportFilter) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(status) = filter.status {
        params.push(("status", format!("eq.{}", status.as_str())));
    }
    if let Some(min) = filter.min_severity {
        params.push(("severity", format!("gte.{min}")));
    }
    if let Some(category) = &filter.category {
        params.push(("category", format!("ilike.{category}")));
    }
    params
}

#[async_trait]
impl ReportStore for RestReportStore {
    async fn insert(&self, report: &Report) -> Result<ReportId, StoreError> {
        let response = self
            .request(reqwest::Method::POST)
            .header("Prefer", "return=representation")
            .json(report)
            .send()
            .await?;
        let body: Value = check_status(response).await?.json().await?;
        let id = inserted_id(&body, &report.id);
        debug!(report_id = %id, sent_id = %report.id, "report_row_inserted");
        Ok(id)
    }

    async fn query_recent(
        &self,
        limit: usize,
        filter: &ReportFilter,
    ) -> Result<Vec<Report>, StoreError> {
        let mut params = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
            ("limit", limit.to_string()),
        ];
        params.extend(filter_params(filter));
        self.select(params).await
    }

    async fn query_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
        filter: &ReportFilter,
    ) -> Result<Option<Report>, StoreError> {
        let mut params = vec![
            ("select", "*".to_string()),
            ("image_hash", format!("eq.{fingerprint}")),
            ("order", "created_at.desc".to_string()),
            ("limit", "1".to_string()),
        ];
        params.extend(filter_params(filter));
        Ok(self.select(params).await?.into_iter().next())
    }

    fn name(&self) -> &str {
        "rest"
    }
}

/// Row id as the table stores it: text ids as-is, numeric ids as decimal.
fn row_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Id of the row PostgREST echoed back after an insert. Falls back to the id
/// that was sent when the representation is hidden (e.g. by row-level
/// security on SELECT).
pub(crate) fn inserted_id(body: &Value, sent: &ReportId) -> ReportId {
    let row = match body {
        Value::Array(rows) => rows.first(),
        Value::Object(_) => Some(body),
        _ => None,
    };
    match row.and_then(|r| r.get("id")).and_then(row_id) {
        Some(id) => ReportId::new(id),
        None => {
            warn!(report_id = %sent, "insert_returned_no_id");
            sent.clone()
        }
    }
}

/// A row as it comes back from the table. Columns written by older clients
/// may be null, so everything but the position is optional.
#[derive(Debug, Deserialize)]
pub(crate) struct ReportRow {
    id: Value,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    severity: Option<f64>,
    #[serde(default)]
    description: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    image_hash: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    upvotes: Option<u32>,
    created_at: Option<DateTime<Utc>>,
}

impl ReportRow {
    /// Convert to a [`Report`], dropping rows without id or position.
    pub(crate) fn into_report(self) -> Option<Report> {
        let Some(id) = row_id(&self.id) else {
            warn!("report_row_without_id");
            return None;
        };
        let (Some(lat), Some(lng)) = (self.lat, self.lng) else {
            warn!(report_id = %id, "report_row_without_location");
            return None;
        };
        let severity = clamp_severity(self.severity.unwrap_or(1.0).round() as i64);
        let status = self
            .status
            .as_deref()
            .and_then(|s| s.parse::<ReportStatus>().ok())
            .unwrap_or_default();

        Some(Report {
            id: ReportId::new(id),
            user_id: self.user_id,
            category: self.category.unwrap_or_default(),
            severity,
            description: self.description.unwrap_or_default(),
            lat,
            lng,
            image: ImageRef::parse(self.image_url.as_deref().unwrap_or_default()),
            fingerprint: Fingerprint::new(self.image_hash.unwrap_or_default()),
            status,
            priority: Priority::from_severity(severity),
            upvotes: self.upvotes.unwrap_or(0),
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Bucket in Supabase-style object storage (`/storage/v1/object/<bucket>`).
#[derive(Debug, Clone)]
pub struct RestImageStore {
    client: reqwest::Client,
    upload_url: String,
    public_url: String,
    api_key: String,
}

impl RestImageStore {
    pub fn new(cfg: &StoreConfig) -> Result<Self, StoreError> {
        let (base_url, api_key) = credentials(cfg)?;
        Ok(Self {
            client: build_client(cfg)?,
            upload_url: format!("{base_url}/storage/v1/object/{}", cfg.image_bucket),
            public_url: format!("{base_url}/storage/v1/object/public/{}", cfg.image_bucket),
            api_key,
        })
    }

    pub fn public_url_for(&self, object: &str) -> String {
        format!("{}/{object}", self.public_url)
    }
}

#[async_trait]
impl ImageStore for RestImageStore {
    async fn upload(&self, image: &UploadedImage) -> Result<ImageRef, StoreError> {
        let name = object_name(image);
        let response = self
            .client
            .post(format!("{}/{name}", self.upload_url))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header(reqwest::header::CONTENT_TYPE, image.mime_type())
            .header("x-upsert", "true")
            .body(image.bytes().to_vec())
            .send()
            .await?;
        check_status(response).await?;
        Ok(ImageRef::Url(self.public_url_for(&name)))
    }

    /// Public objects are plain URLs; the caller fetches them over HTTP.
    async fn fetch(&self, _image: &ImageRef) -> Result<Option<UploadedImage>, StoreError> {
        Ok(None)
    }
}
