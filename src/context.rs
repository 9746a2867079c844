use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Feature flag: translate the stored description to English.
pub const FLAG_TRANSLATE_DESCRIPTION: &str = "translate_description";

/// Who is submitting and with which preferences.
///
/// Passed explicitly to the coordinator instead of being read from ambient
/// UI state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionContext {
    pub user_id: Option<String>,
    /// BCP-47 tag such as `en-IN` or `hi-IN`.
    pub locale: Option<String>,
    #[serde(default)]
    pub feature_flags: BTreeSet<String>,
}

impl SubmissionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.feature_flags.insert(flag.into());
        self
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.feature_flags.contains(flag)
    }

    /// Descriptions are translated when asked for explicitly or when the
    /// user writes in Hindi.
    pub fn wants_translation(&self) -> bool {
        self.has_flag(FLAG_TRANSLATE_DESCRIPTION)
            || self
                .locale
                .as_deref()
                .is_some_and(|l| l.eq_ignore_ascii_case("hi") || l.to_ascii_lowercase().starts_with("hi-"))
    }
}
