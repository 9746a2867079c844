use async_trait::async_trait;
use ingest::UploadedImage;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::OracleError;
use crate::parse::parse_classification;
use crate::retry::{execute_with_retry_async, RetryConfig, RetryResult};
use crate::transport::{OracleRequest, VisionOracle};
use crate::types::ClassificationResult;

/// Classifies a photo into a civic issue category with a severity score.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Fails with [`OracleError::Classification`] once every attempt failed.
    async fn classify(&self, image: &UploadedImage) -> Result<ClassificationResult, OracleError>;
}

/// [`Classifier`] backed by a [`VisionOracle`], with the retry policy applied
/// around each call. Malformed answers are retried like any other failure.
#[derive(Clone)]
pub struct ClassificationClient {
    oracle: Arc<dyn VisionOracle>,
    retry: RetryConfig,
}

impl ClassificationClient {
    pub fn new(oracle: Arc<dyn VisionOracle>, retry: RetryConfig) -> Self {
        Self { oracle, retry }
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Run the retried call and return the full attempt record.
    pub async fn classify_with_report(
        &self,
        image: &UploadedImage,
    ) -> RetryResult<ClassificationResult, OracleError> {
        execute_with_retry_async(&self.retry, |_attempt| {
            let oracle = Arc::clone(&self.oracle);
            let request = OracleRequest::classify(image);
            async move {
                let text = oracle.generate(request).await?;
                parse_classification(&text)
            }
        })
        .await
    }
}

#[async_trait]
impl Classifier for ClassificationClient {
    async fn classify(&self, image: &UploadedImage) -> Result<ClassificationResult, OracleError> {
        let report = self.classify_with_report(image).await;
        let attempts = report.attempts;
        let elapsed_ms = report.total_duration.as_millis() as u64;

        match report.result {
            Ok(result) => {
                info!(
                    oracle = self.oracle.name(),
                    category = %result.category,
                    severity = result.severity_score,
                    attempts,
                    elapsed_ms,
                    "classification_success"
                );
                Ok(result)
            }
            Err(last) => {
                warn!(
                    oracle = self.oracle.name(),
                    attempts,
                    elapsed_ms,
                    error = %last,
                    "classification_failure"
                );
                Err(OracleError::Classification {
                    attempts,
                    last: Box::new(last),
                })
            }
        }
    }
}
