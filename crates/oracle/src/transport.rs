use async_trait::async_trait;
use ingest::UploadedImage;

use crate::error::OracleError;
use crate::prompts::{translation_prompt, CLASSIFICATION_PROMPT, COMPARISON_PROMPT};

/// The kind of question being put to the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleTask {
    Classify,
    Compare,
    /// Carries the untranslated text so offline backends can echo it.
    Translate(String),
}

/// One generate call: a prompt plus zero or more inline images.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub task: OracleTask,
    pub prompt: String,
    pub images: Vec<UploadedImage>,
    /// Ask the backend for a JSON-only answer.
    pub json_response: bool,
}

impl OracleRequest {
    pub fn classify(image: &UploadedImage) -> Self {
        Self {
            task: OracleTask::Classify,
            prompt: CLASSIFICATION_PROMPT.to_string(),
            images: vec![image.clone()],
            json_response: true,
        }
    }

    /// The new image always comes first.
    pub fn compare(new_image: &UploadedImage, candidate: &UploadedImage) -> Self {
        Self {
            task: OracleTask::Compare,
            prompt: COMPARISON_PROMPT.to_string(),
            images: vec![new_image.clone(), candidate.clone()],
            json_response: true,
        }
    }

    pub fn translate(text: &str) -> Self {
        Self {
            task: OracleTask::Translate(text.to_string()),
            prompt: translation_prompt(text),
            images: Vec::new(),
            json_response: false,
        }
    }
}

/// A vision-language backend that turns a prompt and images into text.
///
/// Implementations return the raw model text; decoding is done by the
/// callers so that every backend is held to the same parsing rules.
#[async_trait]
pub trait VisionOracle: Send + Sync {
    async fn generate(&self, request: OracleRequest) -> Result<String, OracleError>;

    /// Short label used in logs.
    fn name(&self) -> &str {
        "oracle"
    }
}
