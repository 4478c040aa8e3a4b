//! Completion invoker: one model, one parameter set.
//!
//! Performs a single logical call against one model, absorbing the failures that the
//! same model can recover from: one optional field rejected by the model, and
//! transient service trouble. Everything else is handed back classified.

use crate::error::CallError;
use crate::generation::classify::{classify, FailureKind};
use crate::generation::request::{AttemptOutcome, AttemptRecord};
use crate::provider::{CallRequest, GenerativeBackend};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_MAX_TRANSIENT_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(500);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Timeout and retry budget applied to every call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokePolicy {
    pub call_timeout: Duration,
    pub max_transient_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for InvokePolicy {
    fn default() -> Self {
        Self {
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_transient_retries: DEFAULT_MAX_TRANSIENT_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }
}

impl InvokePolicy {
    /// Delay before transient retry number `retry` (0-based), doubling each time.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.min(16);
        self.retry_base_delay
            .saturating_mul(factor)
            .min(MAX_RETRY_DELAY)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvokeError {
    /// The model could not produce a response. `kind` is never `UnsupportedParameter`:
    /// a model that keeps rejecting the request shape is reported as unavailable.
    Failed { kind: FailureKind, error: CallError },
    Cancelled,
}

#[derive(Clone)]
pub struct CompletionInvoker {
    backend: Arc<dyn GenerativeBackend>,
    policy: InvokePolicy,
    cancel: CancellationToken,
}

impl CompletionInvoker {
    pub fn new(
        backend: Arc<dyn GenerativeBackend>,
        policy: InvokePolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            policy,
            cancel,
        }
    }

    pub fn policy(&self) -> &InvokePolicy {
        &self.policy
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run one logical call, appending a record for every physical attempt.
    pub async fn invoke(
        &self,
        call: CallRequest,
        attempts: &mut Vec<AttemptRecord>,
    ) -> Result<Value, InvokeError> {
        let mut request = call;
        let mut stripped_field: Option<String> = None;
        let mut transient_retries = 0u32;

        loop {
            if self.cancel.is_cancelled() {
                return Err(InvokeError::Cancelled);
            }

            let attempt = attempts.len() + 1;
            let start = Instant::now();
            debug!(
                model = %request.model,
                attempt,
                params = request.params.len(),
                backend = self.backend.backend_name(),
                "Provider request sent"
            );

            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(InvokeError::Cancelled),
                result = tokio::time::timeout(self.policy.call_timeout, self.backend.call(&request)) => {
                    result.unwrap_or_else(|_| Err(CallError::timed_out(self.policy.call_timeout)))
                }
            };

            let error = match outcome {
                Ok(value) => {
                    attempts.push(AttemptRecord {
                        model: request.model.clone(),
                        params: request.params.clone(),
                        outcome: AttemptOutcome::Success,
                    });
                    info!(
                        model = %request.model,
                        attempt,
                        duration_ms = start.elapsed().as_millis() as u64,
                        "Provider response received"
                    );
                    return Ok(value);
                }
                Err(error) => error,
            };

            let kind = classify(&error);
            attempts.push(AttemptRecord {
                model: request.model.clone(),
                params: request.params.clone(),
                outcome: AttemptOutcome::Failure { kind: kind.clone() },
            });
            warn!(
                model = %request.model,
                attempt,
                kind = %kind,
                status = ?error.status,
                duration_ms = start.elapsed().as_millis() as u64,
                error = %error,
                "Provider request failed"
            );

            match kind {
                FailureKind::UnsupportedParameter { field }
                    if stripped_field.is_none() && request.params.contains(&field) =>
                {
                    info!(model = %request.model, field = %field, "Retrying without rejected parameter");
                    request.params = request.params.without(&field);
                    stripped_field = Some(field);
                }
                FailureKind::UnsupportedParameter { .. } => {
                    return Err(InvokeError::Failed {
                        kind: FailureKind::ModelUnavailable,
                        error,
                    });
                }
                FailureKind::Transient if transient_retries < self.policy.max_transient_retries => {
                    let delay = self.policy.backoff(transient_retries);
                    transient_retries += 1;
                    info!(
                        model = %request.model,
                        retry = transient_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after transient failure"
                    );
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => return Err(InvokeError::Cancelled),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                kind => return Err(InvokeError::Failed { kind, error }),
            }
        }
    }
}
