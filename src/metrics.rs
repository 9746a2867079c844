use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

use crate::error::OutcomeCode;

/// Metrics observer for submission attempts.
pub trait PipelineMetrics: Send + Sync {
    /// `outcome` is `None` for failures without a user-facing code.
    fn record_submission(&self, latency: Duration, outcome: Option<OutcomeCode>);
    fn record_classification(&self, latency: Duration, succeeded: bool);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_submission(self, outcome: Option<OutcomeCode>) {
        self.recorder.record_submission(self.start.elapsed(), outcome);
    }

    pub(crate) fn record_classification(self, succeeded: bool) {
        self.recorder
            .record_classification(self.start.elapsed(), succeeded);
    }
}
