use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Which persistence backend to use and how to reach it.
///
/// # Example
/// ```
/// use store::StoreConfig;
///
/// let cfg = StoreConfig::default();
/// assert_eq!(cfg.mode, "memory");
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    /// `"memory"` (process-local) or `"rest"` (PostgREST + object storage).
    pub mode: String,
    /// Project base URL in rest mode, e.g. `https://xyz.supabase.co`.
    pub base_url: Option<String>,
    /// Service key sent as `apikey` and bearer token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub reports_table: String,
    pub image_bucket: String,
    pub timeout_secs: Option<u64>,
    /// Keep the image inline on the report when the upload fails.
    pub inline_image_fallback: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mode: "memory".into(),
            base_url: None,
            api_key: None,
            reports_table: "reports".into(),
            image_bucket: "report-images".into(),
            timeout_secs: Some(30),
            inline_image_fallback: true,
        }
    }
}

impl StoreConfig {
    pub fn is_rest(&self) -> bool {
        self.mode.eq_ignore_ascii_case("rest")
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        match self.mode.to_ascii_lowercase().as_str() {
            "memory" => {}
            "rest" => {
                if self.base_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                    return Err(StoreError::InvalidConfig(
                        "base_url is required for rest mode".into(),
                    ));
                }
                if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
                    return Err(StoreError::InvalidConfig(
                        "api_key is required for rest mode".into(),
                    ));
                }
            }
            other => {
                return Err(StoreError::InvalidConfig(format!(
                    "unknown store mode '{other}' (expected 'memory' or 'rest')"
                )))
            }
        }
        if self.reports_table.trim().is_empty() || self.image_bucket.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "reports_table and image_bucket must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_mode_needs_url_and_key() {
        let mut cfg = StoreConfig {
            mode: "rest".into(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        cfg.base_url = Some("https://db.example.org".into());
        assert!(cfg.validate().is_err());
        cfg.api_key = Some("key".into());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let cfg = StoreConfig {
            mode: "redb".into(),
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(StoreError::InvalidConfig(_))));
    }
}
