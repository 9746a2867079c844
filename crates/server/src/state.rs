use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use axum::http::HeaderMap;
use dhaal::{DhaalConfig, IngestionCoordinator, SubmissionContext};
use std::sync::Arc;

/// Header carrying the authenticated citizen's id.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the client's UI locale, e.g. `hi-IN`.
pub const LOCALE_HEADER: &str = "x-locale";

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<ServerConfig>,
    /// Anonymous coordinator; handlers derive a per-request context from it.
    pub coordinator: IngestionCoordinator,
}

impl ServerState {
    /// Build the pipeline from `config.pipeline_config`, or offline if unset.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let pipeline = match config.pipeline_config.as_deref() {
            Some(path) => {
                DhaalConfig::from_file(path).map_err(|e| ServerError::Config(e.to_string()))?
            }
            None => {
                tracing::warn!("no pipeline_config set, running offline with stub oracle");
                DhaalConfig::offline()
            }
        };
        let coordinator = IngestionCoordinator::from_config(&pipeline)
            .map_err(|e| ServerError::Config(e.to_string()))?;
        Ok(Self::with_coordinator(config, coordinator))
    }

    pub fn with_coordinator(config: ServerConfig, coordinator: IngestionCoordinator) -> Self {
        Self {
            config: Arc::new(config),
            coordinator,
        }
    }

    /// Coordinator bound to the caller identified by the request headers.
    pub fn coordinator_for(&self, headers: &HeaderMap) -> IngestionCoordinator {
        let mut context = match header(headers, USER_ID_HEADER) {
            Some(user) => SubmissionContext::for_user(user),
            None => SubmissionContext::anonymous(),
        };
        if let Some(locale) = header(headers, LOCALE_HEADER) {
            context = context.with_locale(locale);
        }
        self.coordinator.clone().with_context(context)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
