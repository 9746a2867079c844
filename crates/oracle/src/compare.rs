use async_trait::async_trait;
use ingest::{ImageRef, UploadedImage};
use std::sync::Arc;
use tracing::debug;

use crate::error::OracleError;
use crate::loader::CandidateImageLoader;
use crate::parse::parse_verdict;
use crate::transport::{OracleRequest, VisionOracle};
use crate::types::SimilarityVerdict;

/// Judges whether a new photo shows the same issue as a stored one.
///
/// A single call per pair; there is no retry at this layer. Every failure is
/// reported as [`OracleError::Comparison`].
#[async_trait]
pub trait SimilarityOracle: Send + Sync {
    async fn compare_images(
        &self,
        new_image: &UploadedImage,
        candidate: &ImageRef,
    ) -> Result<SimilarityVerdict, OracleError>;
}

/// [`SimilarityOracle`] that loads the candidate image and asks a
/// [`VisionOracle`] to compare the pair.
#[derive(Clone)]
pub struct SimilarityClient {
    oracle: Arc<dyn VisionOracle>,
    loader: Arc<dyn CandidateImageLoader>,
}

impl SimilarityClient {
    pub fn new(oracle: Arc<dyn VisionOracle>, loader: Arc<dyn CandidateImageLoader>) -> Self {
        Self { oracle, loader }
    }
}

fn as_comparison(err: OracleError) -> OracleError {
    match err {
        OracleError::Comparison(_) => err,
        other => OracleError::Comparison(other.to_string()),
    }
}

#[async_trait]
impl SimilarityOracle for SimilarityClient {
    async fn compare_images(
        &self,
        new_image: &UploadedImage,
        candidate: &ImageRef,
    ) -> Result<SimilarityVerdict, OracleError> {
        let candidate_image = self.loader.load(candidate).await.map_err(as_comparison)?;
        let text = self
            .oracle
            .generate(OracleRequest::compare(new_image, &candidate_image))
            .await
            .map_err(as_comparison)?;
        let verdict = parse_verdict(&text).map_err(as_comparison)?;

        debug!(
            oracle = self.oracle.name(),
            is_same = verdict.is_same,
            confidence = verdict.confidence,
            "comparison_verdict"
        );
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::HttpImageLoader;
    use crate::testing::ScriptedOracle;
    use crate::transport::OracleTask;

    fn client(oracle: Arc<ScriptedOracle>) -> SimilarityClient {
        let loader = Arc::new(HttpImageLoader::new(None, None).unwrap());
        SimilarityClient::new(oracle, loader)
    }

    fn images() -> (UploadedImage, ImageRef) {
        let new_image = UploadedImage::new(vec![1u8, 2, 3], "image/jpeg");
        let stored = ImageRef::inline(&UploadedImage::new(vec![4u8, 5, 6], "image/png"));
        (new_image, stored)
    }

    #[tokio::test]
    async fn sends_both_images_in_one_call() {
        let oracle = Arc::new(ScriptedOracle::new(vec![Ok(
            r#"{"isSame":true,"confidence":85,"reason":"same junction"}"#.into(),
        )]));
        let (new_image, stored) = images();

        let verdict = client(oracle.clone())
            .compare_images(&new_image, &stored)
            .await
            .unwrap();
        assert!(verdict.is_same);
        assert_eq!(verdict.confidence, 85);
        assert_eq!(oracle.calls(), 1);
        assert_eq!(oracle.tasks(), vec![OracleTask::Compare]);
        assert_eq!(oracle.image_counts(), vec![2]);
    }

    #[tokio::test]
    async fn failures_are_not_retried() {
        let oracle = Arc::new(ScriptedOracle::new(vec![Err(OracleError::Http {
            status: 429,
            body: "Resource exhausted".into(),
        })]));
        let (new_image, stored) = images();

        let err = client(oracle.clone())
            .compare_images(&new_image, &stored)
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::Comparison(msg) if msg.contains("429")));
        assert_eq!(oracle.calls(), 1);
    }

    #[tokio::test]
    async fn malformed_verdict_is_a_comparison_error() {
        let oracle = Arc::new(ScriptedOracle::new(vec![Ok("probably the same".into())]));
        let (new_image, stored) = images();

        let err = client(oracle)
            .compare_images(&new_image, &stored)
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::Comparison(_)));
    }

    #[tokio::test]
    async fn unloadable_candidate_skips_the_oracle() {
        let oracle = Arc::new(ScriptedOracle::new(vec![]));
        let new_image = UploadedImage::new(vec![1u8], "image/jpeg");

        let err = client(oracle.clone())
            .compare_images(&new_image, &ImageRef::Url(String::new()))
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::Comparison(_)));
        assert_eq!(oracle.calls(), 0);
    }
}
