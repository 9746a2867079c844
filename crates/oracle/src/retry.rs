//! Retry policy for oracle calls.
//!
//! Unlike a classic exponential schedule, the wait grows linearly with the
//! attempt number and the step depends on whether the failure looked like
//! rate limiting:
//!
//! | failed attempt | rate limited | otherwise |
//! |----------------|--------------|-----------|
//! | 1              | 15s          | 3s        |
//! | 2              | 30s          | 6s        |
//! | 3 (last)       | no wait      | no wait   |
//!
//! Waits only suspend the current task, so unrelated submissions keep running.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::warn;

use crate::error::{is_rate_limited_message, OracleError};

/// Configuration for retry behavior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Wait step after a rate-limited failure, in milliseconds.
    #[serde(with = "millis")]
    pub rate_limited_step: Duration,
    /// Wait step after any other failure, in milliseconds.
    #[serde(with = "millis")]
    pub transient_step: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limited_step: Duration::from_secs(15),
            transient_step: Duration::from_secs(3),
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn with_rate_limited_step(mut self, step: Duration) -> Self {
        self.rate_limited_step = step;
        self
    }

    pub fn with_transient_step(mut self, step: Duration) -> Self {
        self.transient_step = step;
        self
    }

    /// Wait after failed `attempt` (1-based) before the next one.
    pub fn delay_after(&self, attempt: u32, rate_limited: bool) -> Duration {
        let step = if rate_limited {
            self.rate_limited_step
        } else {
            self.transient_step
        };
        step.saturating_mul(attempt)
    }
}

/// Something that can tell whether it represents a rate-limit rejection.
pub trait RateLimitSignal {
    fn is_rate_limited(&self) -> bool;
}

impl RateLimitSignal for OracleError {
    fn is_rate_limited(&self) -> bool {
        OracleError::is_rate_limited(self)
    }
}

impl RateLimitSignal for String {
    fn is_rate_limited(&self) -> bool {
        is_rate_limited_message(self)
    }
}

/// Result of a retried operation.
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// The final result (success or last error).
    pub result: Result<T, E>,
    /// Number of attempts made (1 = first try succeeded).
    pub attempts: u32,
    /// Waits inserted between attempts, in order.
    pub delays: Vec<Duration>,
    /// Wall-clock time spent, waits included.
    pub total_duration: Duration,
}

impl<T, E> RetryResult<T, E> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Run `operation` until it succeeds or `config.max_attempts` is reached.
///
/// The closure receives the 1-based attempt number. No wait follows the final
/// attempt. A `max_attempts` of zero is treated as one.
pub async fn execute_with_retry_async<T, E, F, Fut>(
    config: &RetryConfig,
    mut operation: F,
) -> RetryResult<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: RateLimitSignal + std::fmt::Display,
{
    let start = Instant::now();
    let max_attempts = config.max_attempts.max(1);
    let mut delays = Vec::new();
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                return RetryResult {
                    result: Ok(value),
                    attempts: attempt,
                    delays,
                    total_duration: start.elapsed(),
                };
            }
            Err(err) if attempt >= max_attempts => {
                return RetryResult {
                    result: Err(err),
                    attempts: attempt,
                    delays,
                    total_duration: start.elapsed(),
                };
            }
            Err(err) => {
                let rate_limited = err.is_rate_limited();
                let delay = config.delay_after(attempt, rate_limited);
                warn!(
                    attempt,
                    max_attempts,
                    rate_limited,
                    wait_ms = delay.as_millis() as u64,
                    error = %err,
                    "classification_retry"
                );
                delays.push(delay);
                if !delay.is_zero() {
                    sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn default_schedule() {
        let cfg = RetryConfig::default();
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.delay_after(1, true), Duration::from_secs(15));
        assert_eq!(cfg.delay_after(2, true), Duration::from_secs(30));
        assert_eq!(cfg.delay_after(3, true), Duration::from_secs(45));
        assert_eq!(cfg.delay_after(1, false), Duration::from_secs(3));
        assert_eq!(cfg.delay_after(2, false), Duration::from_secs(6));
        assert_eq!(cfg.delay_after(3, false), Duration::from_secs(9));
    }

    #[test]
    fn config_serializes_steps_as_millis() {
        let json = serde_json::to_value(RetryConfig::default()).unwrap();
        assert_eq!(json["rate_limited_step"], 15000);
        assert_eq!(json["transient_step"], 3000);
        let back: RetryConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, RetryConfig::default());
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_does_not_wait() {
        let result = execute_with_retry_async(&RetryConfig::default(), |_| async {
            Ok::<_, String>("ok")
        })
        .await;
        assert_eq!(result.attempts, 1);
        assert!(result.delays.is_empty());
        assert_eq!(result.into_result().unwrap(), "ok");
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_failures_use_long_steps() {
        let calls = AtomicU32::new(0);
        let result = execute_with_retry_async(&RetryConfig::default(), |attempt| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt < 3 {
                    Err("429 Too Many Requests".to_string())
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert!(result.is_success());
        assert_eq!(result.attempts, 3);
        assert_eq!(
            result.delays,
            vec![Duration::from_secs(15), Duration::from_secs(30)]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_last_error_without_trailing_wait() {
        let result = execute_with_retry_async(&RetryConfig::default(), |attempt| async move {
            Err::<(), _>(format!("boom #{attempt}"))
        })
        .await;

        assert_eq!(result.attempts, 3);
        assert_eq!(
            result.delays,
            vec![Duration::from_secs(3), Duration::from_secs(6)]
        );
        assert_eq!(result.into_result().unwrap_err(), "boom #3");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_runs_once() {
        let cfg = RetryConfig::default().with_max_attempts(0);
        let result =
            execute_with_retry_async(&cfg, |_| async { Err::<(), _>("nope".to_string()) }).await;
        assert_eq!(result.attempts, 1);
        assert!(result.delays.is_empty());
    }
}
