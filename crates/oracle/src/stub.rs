use async_trait::async_trait;
use fxhash::hash64;
use serde_json::json;

use crate::error::OracleError;
use crate::transport::{OracleRequest, OracleTask, VisionOracle};

/// Labels and severities the stub picks from.
const STUB_LABELS: &[(&str, u8)] = &[
    ("Pothole", 6),
    ("Garbage", 4),
    ("Broken Streetlight", 3),
    ("Water Leakage", 5),
    ("Vandalism", 2),
    ("Electrical Hazard", 8),
];

/// Deterministic offline oracle used when `mode = "stub"`.
///
/// Classification is derived from a hash of the image bytes, comparison
/// reports a match only for byte-identical images, and translation echoes its
/// input. Answers are rendered as JSON text so they go through the same
/// parsing as real responses.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubOracle;

impl StubOracle {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VisionOracle for StubOracle {
    async fn generate(&self, request: OracleRequest) -> Result<String, OracleError> {
        match &request.task {
            OracleTask::Classify => {
                let image = request.images.first().ok_or_else(|| {
                    OracleError::MalformedResponse("classification needs an image".into())
                })?;
                let h = hash64(image.bytes());
                let (label, severity) = STUB_LABELS[(h % STUB_LABELS.len() as u64) as usize];
                Ok(json!({
                    "category": label,
                    "severityScore": severity,
                    "description": format!("[stub] {label} detected in a {} byte image.", image.size()),
                })
                .to_string())
            }
            OracleTask::Compare => {
                let [new_image, candidate] = request.images.as_slice() else {
                    return Err(OracleError::Comparison(format!(
                        "comparison needs exactly two images, got {}",
                        request.images.len()
                    )));
                };
                let same = new_image.bytes() == candidate.bytes();
                let (confidence, reason) = if same {
                    (100, "[stub] identical bytes")
                } else {
                    (0, "[stub] bytes differ")
                };
                Ok(json!({
                    "isSame": same,
                    "confidence": confidence,
                    "reason": reason,
                })
                .to_string())
            }
            OracleTask::Translate(text) => Ok(text.clone()),
        }
    }

    fn name(&self) -> &str {
        "stub"
    }
}
