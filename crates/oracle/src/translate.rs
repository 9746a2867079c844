use tracing::warn;

use crate::transport::{OracleRequest, VisionOracle};

/// Translate reporter-entered text (typically Hindi) to English.
///
/// Blank input yields an empty string without calling the oracle. Any failure
/// falls back to the original text.
pub async fn translate_to_english(oracle: &dyn VisionOracle, text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    match oracle.generate(OracleRequest::translate(text)).await {
        Ok(answer) => {
            let cleaned = answer.trim().trim_matches('"').trim();
            if cleaned.is_empty() {
                text.to_string()
            } else {
                cleaned.to_string()
            }
        }
        Err(err) => {
            warn!(oracle = oracle.name(), error = %err, "translation_failed");
            text.to_string()
        }
    }
}
