//! Scripted collaborators shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use dhaal::{
    ClassificationClient, DedupConfig, DuplicateResolver, Fingerprint, ImageRef, ImageStore,
    InMemoryImageStore, InMemoryReportStore, IngestionCoordinator, OracleError, Priority, Report,
    ReportFilter, ReportId, ReportStatus, ReportStore, RetryConfig, SimilarityClient,
    StoreError, StoreImageLoader, Stores, UploadedImage, VisionOracle,
};
use oracle::{CandidateImageLoader, OracleRequest, OracleTask};

pub const BANGALORE: (f64, f64) = (12.9716, 77.5946);

/// Distinct byte patterns give distinct fingerprints.
pub fn photo(seed: u8) -> UploadedImage {
    let bytes: Vec<u8> = (0..512u32)
        .map(|i| (i as u8).wrapping_mul(seed | 1).wrapping_add(seed))
        .collect();
    UploadedImage::new(bytes, "image/jpeg")
}

pub fn classification_json(category: &str, severity: u8) -> String {
    format!(
        r#"{{"category":"{category}","severityScore":{severity},"description":"{category} reported by citizen"}}"#
    )
}

pub fn verdict_json(is_same: bool, confidence: u8) -> String {
    format!(r#"{{"isSame":{is_same},"confidence":{confidence},"reason":"scripted"}}"#)
}

/// Answers each task from its own queue and records what was asked.
#[derive(Default)]
pub struct ScriptedOracle {
    classify: Mutex<VecDeque<Result<String, OracleError>>>,
    compare: Mutex<VecDeque<Result<String, OracleError>>>,
    translate: Mutex<VecDeque<Result<String, OracleError>>>,
    tasks: Mutex<Vec<OracleTask>>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classifies(self, answer: Result<String, OracleError>) -> Self {
        self.classify.lock().unwrap().push_back(answer);
        self
    }

    pub fn compares(self, answer: Result<String, OracleError>) -> Self {
        self.compare.lock().unwrap().push_back(answer);
        self
    }

    pub fn translates(self, answer: Result<String, OracleError>) -> Self {
        self.translate.lock().unwrap().push_back(answer);
        self
    }

    pub fn tasks(&self) -> Vec<OracleTask> {
        self.tasks.lock().unwrap().clone()
    }

    pub fn count(&self, task: &OracleTask) -> usize {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|t| std::mem::discriminant(*t) == std::mem::discriminant(task))
            .count()
    }
}

#[async_trait]
impl VisionOracle for ScriptedOracle {
    async fn generate(&self, request: OracleRequest) -> Result<String, OracleError> {
        self.tasks.lock().unwrap().push(request.task.clone());
        let queue = match request.task {
            OracleTask::Classify => &self.classify,
            OracleTask::Compare => &self.compare,
            OracleTask::Translate(_) => &self.translate,
        };
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Transport("no scripted answer".into())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// In-memory report store that counts calls and can be told to fail.
#[derive(Default)]
pub struct CountingReportStore {
    pub inner: InMemoryReportStore,
    pub inserts: AtomicUsize,
    pub recent_queries: AtomicUsize,
    pub fingerprint_queries: AtomicUsize,
    pub fail_insert: AtomicBool,
    pub fail_queries: AtomicBool,
    /// Keep rows under database-style ids (`row-1`, `row-2`, ...) instead of
    /// the id the caller sent.
    pub assign_ids: AtomicBool,
}

impl CountingReportStore {
    pub fn calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
            + self.recent_queries.load(Ordering::SeqCst)
            + self.fingerprint_queries.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Vec<Report> {
        self.inner.snapshot().unwrap()
    }
}

#[async_trait]
impl ReportStore for CountingReportStore {
    async fn insert(&self, report: &Report) -> Result<ReportId, StoreError> {
        let n = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(StoreError::backend("database unavailable"));
        }
        if self.assign_ids.load(Ordering::SeqCst) {
            let mut row = report.clone();
            row.id = ReportId::new(format!("row-{n}"));
            return self.inner.insert(&row).await;
        }
        self.inner.insert(report).await
    }

    async fn query_recent(
        &self,
        limit: usize,
        filter: &ReportFilter,
    ) -> Result<Vec<Report>, StoreError> {
        self.recent_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::backend("query timed out"));
        }
        self.inner.query_recent(limit, filter).await
    }

    async fn query_by_fingerprint(
        &self,
        fingerprint: &Fingerprint,
        filter: &ReportFilter,
    ) -> Result<Option<Report>, StoreError> {
        self.fingerprint_queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::backend("query timed out"));
        }
        self.inner.query_by_fingerprint(fingerprint, filter).await
    }
}

#[derive(Default)]
pub struct CountingImageStore {
    pub inner: InMemoryImageStore,
    pub uploads: AtomicUsize,
    pub fail_upload: AtomicBool,
}

#[async_trait]
impl ImageStore for CountingImageStore {
    async fn upload(&self, image: &UploadedImage) -> Result<ImageRef, StoreError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(StoreError::backend("bucket unavailable"));
        }
        self.inner.upload(image).await
    }

    async fn fetch(&self, image: &ImageRef) -> Result<Option<UploadedImage>, StoreError> {
        self.inner.fetch(image).await
    }
}

struct NoRemoteImages;

#[async_trait]
impl CandidateImageLoader for NoRemoteImages {
    async fn load(&self, image: &ImageRef) -> Result<UploadedImage, OracleError> {
        Err(OracleError::ImageLoad(format!("offline: {image}")))
    }
}

pub struct Harness {
    pub oracle: Arc<ScriptedOracle>,
    pub reports: Arc<CountingReportStore>,
    pub images: Arc<CountingImageStore>,
    pub coordinator: IngestionCoordinator,
}

impl Harness {
    pub fn new(oracle: ScriptedOracle) -> Self {
        Self::with_dedup(oracle, DedupConfig::default())
    }

    pub fn with_dedup(oracle: ScriptedOracle, dedup: DedupConfig) -> Self {
        let oracle = Arc::new(oracle);
        let reports = Arc::new(CountingReportStore::default());
        let images = Arc::new(CountingImageStore::default());

        let classifier = ClassificationClient::new(oracle.clone(), RetryConfig::default());
        let loader = StoreImageLoader::new(images.clone(), Arc::new(NoRemoteImages));
        let similarity = SimilarityClient::new(oracle.clone(), Arc::new(loader));
        let resolver = DuplicateResolver::new(Arc::new(similarity), dedup);
        let stores = Stores {
            reports: reports.clone(),
            images: images.clone(),
        };
        let coordinator = IngestionCoordinator::new(Arc::new(classifier), resolver, stores)
            .with_translator(oracle.clone());

        Self {
            oracle,
            reports,
            images,
            coordinator,
        }
    }

    /// Store an existing report directly, bypassing the call counters.
    pub async fn seed(
        &self,
        image: &UploadedImage,
        category: &str,
        severity: u8,
        age_minutes: i64,
    ) -> Report {
        self.seed_with_status(image, category, severity, age_minutes, ReportStatus::Open)
            .await
    }

    pub async fn seed_with_status(
        &self,
        image: &UploadedImage,
        category: &str,
        severity: u8,
        age_minutes: i64,
        status: ReportStatus,
    ) -> Report {
        let image_ref = self.images.inner.upload(image).await.unwrap();
        let report = Report {
            id: ReportId::generate(),
            user_id: None,
            category: category.to_string(),
            severity,
            description: format!("{category} seen earlier"),
            lat: BANGALORE.0,
            lng: BANGALORE.1,
            image: image_ref,
            fingerprint: image.fingerprint(),
            status,
            priority: Priority::from_severity(severity),
            upvotes: 0,
            created_at: Utc::now() - ChronoDuration::minutes(age_minutes),
        };
        self.reports.inner.insert(&report).await.unwrap();
        report
    }
}
