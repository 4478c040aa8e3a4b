//! Ordered model fallback for one request.
//!
//! A selector lives for the whole of one orchestration, so a model found unavailable
//! while producing the first segment is not tried again for later segments.

use crate::error::{CallError, GenerationError};
use crate::generation::classify::FailureKind;
use crate::generation::invoker::{CompletionInvoker, InvokeError};
use crate::generation::request::{AttemptRecord, OptionalParams, OutputSchema};
use crate::provider::CallRequest;
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// A model that answered, with its raw response.
#[derive(Debug, Clone)]
pub struct Selection {
    pub model: String,
    pub response: Value,
}

pub struct ModelCandidateSelector {
    invoker: CompletionInvoker,
    candidates: Vec<String>,
    system: String,
    token_budget: u32,
    params: OptionalParams,
    schema: Option<OutputSchema>,
    unavailable: BTreeSet<String>,
    attempts: Vec<AttemptRecord>,
}

impl ModelCandidateSelector {
    pub fn new(
        invoker: CompletionInvoker,
        candidates: Vec<String>,
        system: String,
        token_budget: u32,
        params: OptionalParams,
        schema: Option<OutputSchema>,
    ) -> Self {
        Self {
            invoker,
            candidates,
            system,
            token_budget,
            params,
            schema,
            unavailable: BTreeSet::new(),
            attempts: Vec::new(),
        }
    }

    /// Attempt log so far, oldest first
    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    pub fn into_attempts(self) -> Vec<AttemptRecord> {
        self.attempts
    }

    pub fn is_unavailable(&self, model: &str) -> bool {
        self.unavailable.contains(model)
    }

    /// Get a response for `turns` from the first candidate that can serve it.
    pub async fn select(&mut self, turns: Vec<String>) -> Result<Selection, GenerationError> {
        let mut attempted = 0usize;
        let mut last: Option<CallError> = None;

        for model in self.candidates.clone() {
            if self.unavailable.contains(&model) {
                continue;
            }
            attempted += 1;

            let call = CallRequest {
                model: model.clone(),
                system: self.system.clone(),
                turns: turns.clone(),
                token_budget: self.token_budget,
                params: self.params.clone(),
                schema: self.schema.clone(),
            };

            match self.invoker.invoke(call, &mut self.attempts).await {
                Ok(response) => {
                    info!(model = %model, candidates_tried = attempted, "Model selected");
                    return Ok(Selection { model, response });
                }
                Err(InvokeError::Cancelled) => return Err(GenerationError::Cancelled),
                Err(InvokeError::Failed {
                    kind: FailureKind::Fatal,
                    error,
                }) => {
                    return Err(GenerationError::Fatal {
                        model,
                        source: error,
                    });
                }
                Err(InvokeError::Failed { kind, error }) => {
                    if kind == FailureKind::ModelUnavailable {
                        self.unavailable.insert(model.clone());
                    }
                    warn!(model = %model, kind = %kind, "Falling back to next model candidate");
                    last = Some(error);
                }
            }
        }

        Err(GenerationError::NoModelAvailable {
            attempted,
            last: last
                .unwrap_or_else(|| CallError::new("Every model candidate is unavailable")),
        })
    }
}
