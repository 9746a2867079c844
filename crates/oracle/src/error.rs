use thiserror::Error;

/// Errors surfaced by the oracle clients.
///
/// `Classification`, `MalformedResponse` and `Comparison` are the outcomes the
/// pipeline reasons about; the remaining variants describe why a single call
/// failed and feed the retry policy.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Classification failed on every attempt. Carries the last underlying error.
    #[error("AI analysis failed after {attempts} attempts: {last}")]
    Classification {
        attempts: u32,
        #[source]
        last: Box<OracleError>,
    },
    /// The oracle answered, but not with the expected JSON document.
    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),
    /// A single image comparison failed.
    #[error("image comparison failed: {0}")]
    Comparison(String),
    /// The service answered with a non-success status.
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },
    /// The request never produced a response (DNS, TLS, timeout, ...).
    #[error("transport failure: {0}")]
    Transport(String),
    /// A candidate image could not be loaded for comparison.
    #[error("image load failed: {0}")]
    ImageLoad(String),
    /// Configuration is inconsistent (e.g. api mode without an endpoint).
    #[error("invalid oracle config: {0}")]
    InvalidConfig(String),
}

impl OracleError {
    /// Whether the failure signals rate limiting (HTTP 429 / resource exhausted).
    pub fn is_rate_limited(&self) -> bool {
        match self {
            OracleError::Http { status: 429, .. } => true,
            OracleError::Classification { last, .. } => last.is_rate_limited(),
            other => is_rate_limited_message(&other.to_string()),
        }
    }
}

/// Rate-limit markers recognised in free-form error text.
pub fn is_rate_limited_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("429")
        || lower.contains("resource exhausted")
        || lower.contains("resource_exhausted")
        || lower.contains("resource has been exhausted")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_429_is_rate_limited() {
        let err = OracleError::Http {
            status: 429,
            body: "slow down".into(),
        };
        assert!(err.is_rate_limited());
    }

    #[test]
    fn resource_exhausted_text_is_rate_limited() {
        let err = OracleError::Http {
            status: 503,
            body: r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#.into(),
        };
        assert!(err.is_rate_limited());
        assert!(OracleError::Transport("Resource exhausted for project".into()).is_rate_limited());
    }

    #[test]
    fn ordinary_failures_are_not_rate_limited() {
        assert!(!OracleError::Transport("connection reset".into()).is_rate_limited());
        assert!(!OracleError::MalformedResponse("expected value".into()).is_rate_limited());
        assert!(!OracleError::Http {
            status: 500,
            body: "internal".into()
        }
        .is_rate_limited());
    }

    #[test]
    fn classification_error_mentions_last_failure() {
        let err = OracleError::Classification {
            attempts: 3,
            last: Box::new(OracleError::Transport("socket closed".into())),
        };
        let msg = err.to_string();
        assert!(msg.contains("3 attempts"));
        assert!(msg.contains("socket closed"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
