use chrono::Utc;
use dedup::{DedupConfig, DuplicateResolver, DuplicateVerdict};
use ingest::{
    validate_image, GeoPoint, ImageRef, IngestConfig, Report, ReportId, ReportStatus,
    UploadedImage,
};
use oracle::{
    build_oracle, translate_to_english, ClassificationClient, ClassificationResult, Classifier,
    HttpImageLoader, SimilarityClient, VisionOracle,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};

use store::{build_stores, ImageStore, ReportFilter, ReportStore, StoreError, Stores};

use crate::config::{ConfigLoadError, DhaalConfig};
use crate::context::SubmissionContext;
use crate::error::{OutcomeCode, PipelineError};
use crate::loader::StoreImageLoader;
use crate::metrics::MetricsSpan;
use crate::submission::{Submission, SubmissionState};

/// Everything needed for a one-shot submission.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub image: UploadedImage,
    /// `None` when the device never resolved a position.
    pub location: Option<GeoPoint>,
    /// User-edited description replacing the oracle's.
    pub description: Option<String>,
    /// Save even if a duplicate is found.
    pub proceed_anyway: bool,
}

impl SubmissionRequest {
    pub fn new(image: UploadedImage, location: Option<GeoPoint>) -> Self {
        Self {
            image,
            location,
            description: None,
            proceed_anyway: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn proceeding_anyway(mut self) -> Self {
        self.proceed_anyway = true;
        self
    }
}

/// What a finished (non-failed) attempt produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionOutcome {
    pub code: OutcomeCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<Report>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<DuplicateVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<ClassificationResult>,
}

/// Orchestrates one submission attempt: duplicate check, classification,
/// persistence.
///
/// Cheap to clone; every collaborator sits behind an `Arc`. Attempts share no
/// mutable state, so any number may run concurrently.
#[derive(Clone)]
pub struct IngestionCoordinator {
    classifier: Arc<dyn Classifier>,
    resolver: DuplicateResolver,
    reports: Arc<dyn ReportStore>,
    images: Arc<dyn ImageStore>,
    translator: Option<Arc<dyn VisionOracle>>,
    ingest_cfg: IngestConfig,
    inline_fallback: bool,
    context: SubmissionContext,
}

impl IngestionCoordinator {
    pub fn new(classifier: Arc<dyn Classifier>, resolver: DuplicateResolver, stores: Stores) -> Self {
        Self {
            classifier,
            resolver,
            reports: stores.reports,
            images: stores.images,
            translator: None,
            ingest_cfg: IngestConfig::default(),
            inline_fallback: true,
            context: SubmissionContext::default(),
        }
    }

    /// Wire every collaborator from a pipeline config.
    pub fn from_config(cfg: &DhaalConfig) -> Result<Self, ConfigLoadError> {
        let backend = build_oracle(&cfg.oracle)
            .map_err(|e| ConfigLoadError::Validation(format!("oracle: {e}")))?;
        let stores = build_stores(&cfg.store)
            .map_err(|e| ConfigLoadError::Validation(format!("store: {e}")))?;

        let http_loader = HttpImageLoader::new(
            cfg.oracle.api_timeout_secs.map(Duration::from_secs),
            cfg.ingest.max_image_bytes,
        )
        .map_err(|e| ConfigLoadError::Validation(format!("image loader: {e}")))?;
        let loader = StoreImageLoader::new(Arc::clone(&stores.images), Arc::new(http_loader));

        let classifier = ClassificationClient::new(Arc::clone(&backend), cfg.oracle.retry);
        let similarity = SimilarityClient::new(Arc::clone(&backend), Arc::new(loader));
        let resolver = DuplicateResolver::new(Arc::new(similarity), cfg.dedup.clone());

        Ok(Self::new(Arc::new(classifier), resolver, stores)
            .with_translator(backend)
            .with_ingest_config(cfg.ingest.clone())
            .with_inline_fallback(cfg.store.inline_image_fallback))
    }

    pub fn with_context(mut self, context: SubmissionContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_ingest_config(mut self, cfg: IngestConfig) -> Self {
        self.ingest_cfg = cfg;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn VisionOracle>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_inline_fallback(mut self, enabled: bool) -> Self {
        self.inline_fallback = enabled;
        self
    }

    pub fn context(&self) -> &SubmissionContext {
        &self.context
    }

    pub fn ingest_config(&self) -> &IngestConfig {
        &self.ingest_cfg
    }

    pub fn dedup_config(&self) -> &DedupConfig {
        self.resolver.config()
    }

    /// Start an attempt. Rejects images that fail the intake policy.
    pub fn capture(
        &self,
        image: UploadedImage,
        location: Option<GeoPoint>,
    ) -> Result<Submission, PipelineError> {
        validate_image(&image, &self.ingest_cfg)?;
        Ok(Submission::new(image, location))
    }

    fn candidate_filter(&self) -> ReportFilter {
        if self.resolver.config().open_only {
            ReportFilter::open()
        } else {
            ReportFilter::all()
        }
    }

    /// Best-effort duplicate check. Store or oracle trouble degrades to
    /// "not a duplicate".
    pub async fn check_duplicates(&self, image: &UploadedImage) -> DuplicateVerdict {
        let cfg = self.resolver.config();
        let filter = self.candidate_filter();

        if cfg.fingerprint_fast_path && cfg.global_fingerprint_lookup {
            match self
                .reports
                .query_by_fingerprint(&image.fingerprint(), &filter)
                .await
            {
                Ok(Some(hit)) => {
                    info!(
                        report_id = %hit.id,
                        matched_by = "stored_fingerprint",
                        "duplicate_found"
                    );
                    return DuplicateVerdict::fingerprint_match(hit.summary());
                }
                Ok(None) => {}
                Err(err) => warn!(error = %err, "fingerprint_lookup_failed"),
            }
        }

        let candidates: Vec<_> = match self
            .reports
            .query_recent(cfg.candidate_window, &filter)
            .await
        {
            Ok(reports) => reports.iter().map(Report::to_existing).collect(),
            Err(err) => {
                warn!(error = %err, "candidate_query_failed");
                return DuplicateVerdict::unique();
            }
        };

        self.resolver.resolve(image, &candidates).await
    }

    /// `CAPTURED → DUPLICATE_CHECK → (DUPLICATE_WARNING | CLASSIFYING → …)`.
    ///
    /// Also the retry entry point after a failed classification or save.
    pub async fn analyze(&self, submission: &mut Submission) -> Result<SubmissionState, PipelineError> {
        if !submission.state().can_analyze() {
            return Err(PipelineError::InvalidState {
                operation: "analyze",
                state: submission.state(),
            });
        }
        submission.restart();
        submission.transition(SubmissionState::DuplicateCheck);

        let verdict = self.check_duplicates(submission.image()).await;
        if verdict.is_duplicate {
            submission.warn_duplicate(verdict);
            return Ok(SubmissionState::DuplicateWarning);
        }
        self.classify_into(submission).await
    }

    /// Continue past a duplicate warning. Classification runs from scratch and
    /// no further duplicate check happens in this attempt.
    pub async fn proceed_anyway(
        &self,
        submission: &mut Submission,
    ) -> Result<SubmissionState, PipelineError> {
        submission.expect(SubmissionState::DuplicateWarning, "proceed past a duplicate")?;
        submission.mark_proceeded();
        self.classify_into(submission).await
    }

    async fn classify_into(&self, submission: &mut Submission) -> Result<SubmissionState, PipelineError> {
        submission.transition(SubmissionState::Classifying);
        let span = MetricsSpan::start();

        match self.classifier.classify(submission.image()).await {
            Ok(result) => {
                if let Some(span) = span {
                    span.record_classification(true);
                }
                submission.details_ready(result);
                Ok(SubmissionState::DetailsReady)
            }
            Err(err) => {
                if let Some(span) = span {
                    span.record_classification(false);
                }
                submission.classification_failed(err.to_string());
                Err(PipelineError::Classification(err))
            }
        }
    }

    /// `DETAILS_READY → SUBMITTING → (SUBMITTED | SUBMIT_FAILED)`.
    ///
    /// Location is checked first; without it nothing is uploaded or written.
    pub async fn submit(&self, submission: &mut Submission) -> Result<SubmissionOutcome, PipelineError> {
        submission.expect(SubmissionState::DetailsReady, "submit")?;
        let location = match submission.location() {
            Some(point) if point.is_valid() => point,
            _ => return Err(PipelineError::LocationMissing),
        };
        let Some(classification) = submission.classification().cloned() else {
            return Err(PipelineError::InvalidState {
                operation: "submit without classification",
                state: submission.state(),
            });
        };
        submission.transition(SubmissionState::Submitting);

        let image = match self.store_image(submission.image()).await {
            Ok(image) => image,
            Err(err) => {
                warn!(error = %err, "image_upload_failed");
                submission.submit_failed(err.to_string());
                return Err(PipelineError::Store(err));
            }
        };
        let description = self
            .final_description(submission.description().unwrap_or_default())
            .await;

        let mut report = Report {
            id: ReportId::generate(),
            user_id: self.context.user_id.clone(),
            category: classification.category.clone(),
            severity: classification.severity_score,
            description,
            lat: location.lat,
            lng: location.lng,
            image,
            fingerprint: submission.fingerprint().clone(),
            status: ReportStatus::Open,
            priority: classification.priority,
            upvotes: 0,
            created_at: Utc::now(),
        };

        // The store may assign its own id; the one it kept is the one users see.
        report.id = match self.reports.insert(&report).await {
            Ok(stored_id) => stored_id,
            Err(err) => {
                warn!(report_id = %report.id, error = %err, "report_insert_failed");
                submission.submit_failed(err.to_string());
                return Err(PipelineError::Store(err));
            }
        };

        let code = if submission.proceeded_past_warning() {
            OutcomeCode::DuplicateWarnedProceed
        } else {
            OutcomeCode::SubmittedOk
        };
        info!(
            report_id = %report.id,
            category = %report.category,
            severity = report.severity,
            priority = %report.priority,
            emergency = report.is_emergency(),
            outcome = %code,
            "report_submitted"
        );
        submission.submitted(report.clone());

        Ok(SubmissionOutcome {
            code,
            report: Some(report),
            duplicate: submission.duplicate().cloned(),
            classification: Some(classification),
        })
    }

    async fn store_image(&self, image: &UploadedImage) -> Result<ImageRef, StoreError> {
        match self.images.upload(image).await {
            Ok(reference) => Ok(reference),
            Err(err) if self.inline_fallback => {
                warn!(error = %err, "image_upload_failed_storing_inline");
                Ok(ImageRef::inline(image))
            }
            Err(err) => Err(err),
        }
    }

    async fn final_description(&self, text: &str) -> String {
        match &self.translator {
            Some(translator) if self.context.wants_translation() => {
                translate_to_english(translator.as_ref(), text).await
            }
            _ => text.to_string(),
        }
    }

    /// Run a whole attempt in one call.
    ///
    /// A duplicate ends the attempt with `DUPLICATE_BLOCKED` unless
    /// `proceed_anyway` is set. Location, classification and store failures
    /// come back as errors whose [`PipelineError::outcome_code`] names the
    /// user-facing code.
    pub async fn submit_report(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmissionOutcome, PipelineError> {
        let span = MetricsSpan::start();
        let result = self
            .run_submission(request)
            .instrument(info_span!(
                "submission",
                user_id = self.context.user_id.as_deref().unwrap_or("anonymous")
            ))
            .await;

        if let Some(span) = span {
            let outcome = match &result {
                Ok(outcome) => Some(outcome.code),
                Err(err) => err.outcome_code(),
            };
            span.record_submission(outcome);
        }
        if let Err(err) = &result {
            warn!(error = %err, outcome = ?err.outcome_code(), "submission_failed");
        }
        result
    }

    async fn run_submission(
        &self,
        request: SubmissionRequest,
    ) -> Result<SubmissionOutcome, PipelineError> {
        let location = match request.location {
            Some(point) if point.is_valid() => point,
            _ => return Err(PipelineError::LocationMissing),
        };

        let mut submission = self.capture(request.image, Some(location))?;
        let state = self.analyze(&mut submission).await?;

        if state == SubmissionState::DuplicateWarning {
            if !request.proceed_anyway {
                info!(outcome = %OutcomeCode::DuplicateBlocked, "submission_blocked");
                return Ok(SubmissionOutcome {
                    code: OutcomeCode::DuplicateBlocked,
                    report: None,
                    duplicate: submission.duplicate().cloned(),
                    classification: None,
                });
            }
            self.proceed_anyway(&mut submission).await?;
        }

        if let Some(text) = request.description.filter(|d| !d.trim().is_empty()) {
            submission.edit_description(text)?;
        }
        self.submit(&mut submission).await
    }

    /// Recent reports for feeds and maps, newest first.
    pub async fn recent_reports(
        &self,
        limit: usize,
        filter: &ReportFilter,
    ) -> Result<Vec<Report>, PipelineError> {
        Ok(self.reports.query_recent(limit, filter).await?)
    }

    /// Translate free text to English; returns the input on any failure.
    pub async fn translate(&self, text: &str) -> String {
        match &self.translator {
            Some(translator) => translate_to_english(translator.as_ref(), text).await,
            None => text.to_string(),
        }
    }
}
