//! Umbrella crate for the Dhaal civic report ingestion pipeline.
//!
//! A citizen photographs an issue; the [`IngestionCoordinator`] checks the
//! photo against recent open reports, has the vision oracle classify it, and
//! persists a [`Report`] with a priority derived from severity. The stages live
//! in their own crates and are re-exported here so callers need one
//! dependency.
//!
//! ```no_run
//! use dhaal::{DhaalConfig, GeoPoint, IngestionCoordinator, SubmissionRequest, UploadedImage};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = IngestionCoordinator::from_config(&DhaalConfig::offline())?;
//! let image = UploadedImage::new(std::fs::read("pothole.jpg")?, "image/jpeg");
//! let location = GeoPoint::new(12.9716, 77.5946)?;
//!
//! let outcome = coordinator
//!     .submit_report(SubmissionRequest::new(image, Some(location)))
//!     .await?;
//! println!("{}", outcome.code);
//! # Ok(())
//! # }
//! ```

pub mod config;
mod context;
mod coordinator;
mod error;
mod loader;
mod metrics;
mod submission;

pub use crate::config::{ConfigLoadError, DhaalConfig};
pub use crate::context::{SubmissionContext, FLAG_TRANSLATE_DESCRIPTION};
pub use crate::coordinator::{IngestionCoordinator, SubmissionOutcome, SubmissionRequest};
pub use crate::error::{OutcomeCode, PipelineError};
pub use crate::loader::StoreImageLoader;
pub use crate::metrics::{set_pipeline_metrics, PipelineMetrics};
pub use crate::submission::{Submission, SubmissionState};

pub use dedup::{
    set_dedup_metrics, DedupConfig, DedupMetrics, DuplicateResolver, DuplicateVerdict, MatchKind,
};
pub use fingerprint::{fingerprint, Fingerprint};
pub use ingest::{
    accept_image, ExistingReport, GeoPoint, ImageRef, IngestConfig, IngestError, Priority, Report,
    ReportId, ReportStatus, ReportSummary, UploadedImage, EMERGENCY_SEVERITY,
};
pub use oracle::{
    build_oracle, ClassificationClient, ClassificationResult, Classifier, OracleConfig,
    OracleError, RetryConfig, SimilarityClient, SimilarityOracle, SimilarityVerdict, VisionOracle,
};
pub use store::{
    build_stores, ImageStore, InMemoryImageStore, InMemoryReportStore, ReportFilter, ReportStore,
    StoreConfig, StoreError, Stores,
};
