//! # Dhaal Duplicate Resolver (`dedup`)
//!
//! Decides whether a freshly captured photo shows an issue that has already
//! been reported.
//!
//! Two stages, cheapest first:
//!
//! 1. **Fingerprint fast path.** The coarse byte fingerprint of the new image
//!    is compared with the stored fingerprints. An exact hit is a duplicate
//!    and the oracle is never called.
//! 2. **Oracle comparison.** Candidates inside the window are sent to the
//!    [`SimilarityOracle`](oracle::SimilarityOracle) one by one. The first
//!    verdict that says "same" with confidence at or above the threshold
//!    wins. Later candidates are not looked at.
//!
//! Comparison failures are logged and skipped, so a flaky oracle can only
//! ever produce a false "unique", never a blocked submission.
//!
//! ```no_run
//! use std::sync::Arc;
//! use dedup::{DedupConfig, DuplicateResolver};
//! # async fn demo(similarity: Arc<dyn oracle::SimilarityOracle>, image: ingest::UploadedImage) {
//! let resolver = DuplicateResolver::new(similarity, DedupConfig::default());
//! let verdict = resolver.resolve(&image, &[]).await;
//! assert!(!verdict.is_duplicate);
//! # }
//! ```

mod config;
mod metrics;
mod resolver;
mod types;

pub use crate::config::{DedupConfig, DedupConfigError};
pub use crate::metrics::{set_dedup_metrics, DedupMetrics};
pub use crate::resolver::DuplicateResolver;
pub use crate::types::{DuplicateVerdict, MatchKind, Resolution, FINGERPRINT_MATCH_REASON};
