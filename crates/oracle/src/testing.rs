//! Scripted backend for unit tests.
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::OracleError;
use crate::transport::{OracleRequest, OracleTask, VisionOracle};

/// Replays canned answers in order and records every request.
pub(crate) struct ScriptedOracle {
    script: Mutex<VecDeque<Result<String, OracleError>>>,
    requests: Mutex<Vec<OracleRequest>>,
    calls: AtomicUsize,
}

impl ScriptedOracle {
    pub(crate) fn new(script: Vec<Result<String, OracleError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn tasks(&self) -> Vec<OracleTask> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.task.clone())
            .collect()
    }

    pub(crate) fn image_counts(&self) -> Vec<usize> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.images.len())
            .collect()
    }
}

#[async_trait]
impl VisionOracle for ScriptedOracle {
    async fn generate(&self, request: OracleRequest) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Transport("script exhausted".into())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
