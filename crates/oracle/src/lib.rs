//! Dhaal Oracle Clients
//!
//! Everything that talks to the vision-language model lives here: issue
//! classification, pairwise image comparison and free-text translation.
//!
//! Two backends implement [`VisionOracle`]:
//!
//! - **API mode** calls the Gemini `generateContent` endpoint with the images
//!   inlined as base64 parts.
//! - **Stub mode** answers deterministically from the image bytes. Good for
//!   local runs and tests where nobody wants to burn quota.
//!
//! On top of the backend sit the clients the pipeline actually uses:
//!
//! - [`ClassificationClient`] ([`Classifier`]) retries up to three times. The
//!   wait after failed attempt `n` is `n × 15s` when the failure smells like
//!   rate limiting (HTTP 429, "resource exhausted") and `n × 3s` otherwise.
//! - [`SimilarityClient`] ([`SimilarityOracle`]) makes exactly one call per
//!   pair and reports any problem as [`OracleError::Comparison`]. The
//!   duplicate resolver decides what a failed comparison means.
//!
//! Model answers go through [`parse`], which strips code fences and is
//! forgiving about number formats, but never invents a category or a
//! severity that isn't there.
//!
//! ## Example
//!
//! ```
//! use oracle::{build_oracle, ClassificationClient, Classifier, OracleConfig};
//! use ingest::UploadedImage;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let cfg = OracleConfig { mode: "stub".into(), ..Default::default() };
//! let backend = build_oracle(&cfg).unwrap();
//! let classifier = ClassificationClient::new(backend, cfg.retry);
//!
//! let image = UploadedImage::new(vec![0xff, 0xd8, 0xff], "image/jpeg");
//! let result = classifier.classify(&image).await.unwrap();
//! assert!((1..=10).contains(&result.severity_score));
//! # }
//! ```

pub mod config;
pub mod error;
pub mod parse;
pub mod prompts;
pub mod retry;
pub mod types;

mod classify;
mod compare;
mod http;
mod loader;
mod stub;
mod translate;
mod transport;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use tracing::info;

pub use crate::classify::{ClassificationClient, Classifier};
pub use crate::compare::{SimilarityClient, SimilarityOracle};
pub use crate::config::OracleConfig;
pub use crate::error::{is_rate_limited_message, OracleError};
pub use crate::http::HttpOracle;
pub use crate::loader::{load_inline, CandidateImageLoader, HttpImageLoader};
pub use crate::retry::{execute_with_retry_async, RateLimitSignal, RetryConfig, RetryResult};
pub use crate::stub::StubOracle;
pub use crate::translate::translate_to_english;
pub use crate::transport::{OracleRequest, OracleTask, VisionOracle};
pub use crate::types::{ClassificationResult, SimilarityVerdict};

/// Pick the backend described by `cfg.mode`.
pub fn build_oracle(cfg: &OracleConfig) -> Result<Arc<dyn VisionOracle>, OracleError> {
    cfg.validate()?;
    let oracle: Arc<dyn VisionOracle> = if cfg.is_stub() {
        Arc::new(StubOracle::new())
    } else {
        Arc::new(HttpOracle::new(cfg)?)
    };
    info!(mode = %cfg.mode, backend = oracle.name(), "oracle_ready");
    Ok(oracle)
}
