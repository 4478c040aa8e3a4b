//! Replay backend: answers calls from a recorded script instead of the network.
//!
//! Used for offline dry runs (`quill generate --replay script.json`) and by tests.
//! Every received call is kept so callers can inspect what would have been sent.

use crate::error::{CallError, GenerationError};
use crate::provider::{CallRequest, GenerativeBackend};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;
use std::path::Path;

/// One scripted outcome, consumed in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayStep {
    Respond(Value),
    Fail(CallError),
}

pub struct ReplayBackend {
    steps: Mutex<VecDeque<ReplayStep>>,
    received: Mutex<Vec<CallRequest>>,
}

impl ReplayBackend {
    pub fn new(steps: Vec<ReplayStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            received: Mutex::new(Vec::new()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, GenerationError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GenerationError::ConfigError(format!(
                "Failed to read replay script {}: {}",
                path.display(),
                e
            ))
        })?;
        let steps: Vec<ReplayStep> = serde_json::from_str(&content).map_err(|e| {
            GenerationError::ConfigError(format!(
                "Invalid replay script {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::new(steps))
    }

    /// Calls received so far, oldest first
    pub fn received(&self) -> Vec<CallRequest> {
        self.received.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.steps.lock().len()
    }
}

#[async_trait]
impl GenerativeBackend for ReplayBackend {
    async fn call(&self, request: &CallRequest) -> Result<Value, CallError> {
        self.received.lock().push(request.clone());
        match self.steps.lock().pop_front() {
            Some(ReplayStep::Respond(value)) => Ok(value),
            Some(ReplayStep::Fail(error)) => Err(error),
            None => Err(CallError::new("Replay script exhausted")),
        }
    }

    fn backend_name(&self) -> &str {
        "replay"
    }
}
