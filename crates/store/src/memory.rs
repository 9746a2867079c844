use async_trait::async_trait;
use ingest::{Fingerprint, ImageRef, Report, ReportId, UploadedImage};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::backend::{object_name, ImageStore, ReportStore};
use crate::error::StoreError;
use crate::filter::ReportFilter;

/// Scheme of references handed out by [`InMemoryImageStore`].
pub const MEMORY_SCHEME: &str = "memory://";

/// In-memory report table behind a `RwLock`. Useful for tests and stub runs.
#[derive(Default)]
pub struct InMemoryReportStore {
    reports: RwLock<Vec<Report>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every stored report, in insertion order.
    pub fn snapshot(&self) -> Result<Vec<Report>, StoreError> {
        let guard = self
            .reports
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        Ok(guard.clone())
    }

    /// Matching reports, newest first.
    fn newest_first(&self, filter: &ReportFilter) -> Result<Vec<Report>, StoreError> {
        let guard = self
            .reports
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        let mut hits: Vec<(usize, &Report)> = guard
            .iter()
            .enumerate()
            .filter(|(_, r)| filter.matches(r))
            .collect();
        // Insertion order breaks timestamp ties.
        hits.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));
        Ok(hits.into_iter().map(|(_, r)| r.clone()).collect())
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn insert(&self, report: &Report) -> Result<ReportId, StoreError> {
        let mut guard = self
            .reports
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        if guard.iter().any(|r| r.id == report.id) {
            return Err(StoreError::backend(format!(
                "report {} already exists",
                report.id
            )));
        }
        guard.push(report.clone());
        Ok(report.id.clone())
    }

    async fn query_recent(
        &self,
        limit: usize,
        filter: &ReportFilter,
    ) -> Result<Vec<Report>, StoreError> {
        let mut reports = self.newest_first(filter)?;
        reports.truncate(limit);
        Ok(reports)
    }

    async fn query_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
        filter: &ReportFilter,
    ) -> Result<Option<Report>, StoreError> {
        Ok(self
            .newest_first(filter)?
            .into_iter()
            .find(|r| &r.fingerprint == fingerprint))
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// In-memory object store keyed by content-addressed object name.
#[derive(Default)]
pub struct InMemoryImageStore {
    objects: RwLock<HashMap<String, UploadedImage>>,
}

impl InMemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn upload(&self, image: &UploadedImage) -> Result<ImageRef, StoreError> {
        let name = object_name(image);
        self.objects
            .write()
            .map_err(|_| StoreError::backend("poisoned lock"))?
            .insert(name.clone(), image.clone());
        Ok(ImageRef::Url(format!("{MEMORY_SCHEME}{name}")))
    }

    async fn fetch(&self, image: &ImageRef) -> Result<Option<UploadedImage>, StoreError> {
        let ImageRef::Url(url) = image else {
            return Ok(None);
        };
        let Some(name) = url.strip_prefix(MEMORY_SCHEME) else {
            return Ok(None);
        };
        let guard = self
            .objects
            .read()
            .map_err(|_| StoreError::backend("poisoned lock"))?;
        match guard.get(name) {
            Some(found) => Ok(Some(found.clone())),
            None => Err(StoreError::backend(format!("object {name} not found"))),
        }
    }
}
