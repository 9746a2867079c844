use async_trait::async_trait;
use ingest::{Fingerprint, ImageRef, Report, ReportId, UploadedImage};
use sha2::{Digest, Sha256};

use crate::error::StoreError;
use crate::filter::ReportFilter;

/// Durable storage for reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Persist a new report and return the id it was stored under, which
    /// may differ from `report.id` when the backend assigns its own.
    /// Fails if the id is already taken.
    async fn insert(&self, report: &Report) -> Result<ReportId, StoreError>;

    /// Up to `limit` reports matching `filter`, newest first.
    async fn query_recent(
        &self,
        limit: usize,
        filter: &ReportFilter,
    ) -> Result<Vec<Report>, StoreError>;

    /// The newest report matching `filter` that carries `fingerprint`.
    async fn query_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
        filter: &ReportFilter,
    ) -> Result<Option<Report>, StoreError>;

    /// Short label used in logs.
    fn name(&self) -> &str {
        "reports"
    }
}

/// Object storage for report photos.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Store the bytes and return a reference to them.
    async fn upload(&self, image: &UploadedImage) -> Result<ImageRef, StoreError>;

    /// Load an image this store owns. `Ok(None)` for references it does not
    /// recognise, which callers then resolve some other way.
    async fn fetch(&self, image: &ImageRef) -> Result<Option<UploadedImage>, StoreError>;
}

/// Content-addressed object name: sha256 of the bytes plus an extension.
///
/// Uploading the same photo twice lands on the same object.
pub fn object_name(image: &UploadedImage) -> String {
    let digest = Sha256::digest(image.bytes());
    format!("{}.{}", hex::encode(digest), image.extension())
}
