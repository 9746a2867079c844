use async_trait::async_trait;
use ingest::{ImageRef, UploadedImage};
use oracle::{load_inline, CandidateImageLoader, OracleError};
use std::sync::Arc;
use store::ImageStore;

/// Loads candidate images from wherever they live: inline data, the
/// configured image store, or a plain URL as a last resort.
pub struct StoreImageLoader {
    images: Arc<dyn ImageStore>,
    fallback: Arc<dyn CandidateImageLoader>,
}

impl StoreImageLoader {
    pub fn new(images: Arc<dyn ImageStore>, fallback: Arc<dyn CandidateImageLoader>) -> Self {
        Self { images, fallback }
    }
}

#[async_trait]
impl CandidateImageLoader for StoreImageLoader {
    async fn load(&self, image: &ImageRef) -> Result<UploadedImage, OracleError> {
        if let Some(decoded) = load_inline(image)? {
            return Ok(decoded);
        }
        match self.images.fetch(image).await {
            Ok(Some(found)) => Ok(found),
            Ok(None) => self.fallback.load(image).await,
            Err(err) => Err(OracleError::ImageLoad(err.to_string())),
        }
    }
}
