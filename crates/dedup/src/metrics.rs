// Metrics hooks for the `dedup` crate.
//
// Install a global `DedupMetrics` implementation via [`set_dedup_metrics`] and
// every `DuplicateResolver` reports how each resolution ended and how many
// oracle calls it took.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::types::Resolution;

/// Metrics observer for duplicate resolution.
pub trait DedupMetrics: Send + Sync {
    /// `candidates` is the number of reports offered to the resolver.
    fn record_resolution(&self, resolution: &Resolution, candidates: usize, latency: Duration);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn DedupMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn DedupMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn DedupMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global dedup metrics recorder.
pub fn set_dedup_metrics(recorder: Option<Arc<dyn DedupMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
