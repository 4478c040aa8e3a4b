//! Generation orchestrator: the single entry point callers use.

use crate::error::GenerationError;
use crate::generation::extract::PART_SEPARATOR;
use crate::generation::invoker::{CompletionInvoker, InvokePolicy};
use crate::generation::request::{GenerationRequest, GenerationResult};
use crate::generation::schema::apply_schema;
use crate::generation::segments::{marker_instruction, SegmentedGenerator};
use crate::generation::selector::ModelCandidateSelector;
use crate::provider::GenerativeBackend;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Turns a [`GenerationRequest`] into a complete [`GenerationResult`].
///
/// Holds only the backend handle and an immutable retry policy, so one orchestrator
/// can serve any number of concurrent requests.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    backend: Arc<dyn GenerativeBackend>,
    policy: InvokePolicy,
}

impl GenerationOrchestrator {
    pub fn new(backend: Arc<dyn GenerativeBackend>) -> Self {
        Self {
            backend,
            policy: InvokePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: InvokePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &InvokePolicy {
        &self.policy
    }

    pub async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResult, GenerationError> {
        self.generate_with_cancel(request, CancellationToken::new())
            .await
    }

    /// Like [`generate`](Self::generate), aborting as soon as `cancel` fires.
    /// Partial text is discarded on cancellation.
    pub async fn generate_with_cancel(
        &self,
        request: GenerationRequest,
        cancel: CancellationToken,
    ) -> Result<GenerationResult, GenerationError> {
        request.validate()?;
        let start = Instant::now();

        let system = format!(
            "{}\n\n{}",
            request.system.trim_end(),
            marker_instruction(&request.continuation_marker)
        );

        let invoker = CompletionInvoker::new(self.backend.clone(), self.policy.clone(), cancel);
        let mut selector = ModelCandidateSelector::new(
            invoker,
            request.model_candidates.clone(),
            system,
            request.token_budget,
            request.params.clone(),
            request.schema.clone(),
        );

        let generator = SegmentedGenerator {
            base_turns: &request.turns,
            max_segments: request.max_segments,
            completeness: &request.completeness,
            marker: &request.continuation_marker,
            separator: if request.schema.is_some() {
                ""
            } else {
                PART_SEPARATOR
            },
        };
        let outcome = generator.run(&mut selector).await?;

        let (structured, schema_fallback_used) = match &request.schema {
            Some(schema) => {
                let result = apply_schema(&outcome.text, schema);
                (Some(result.value), result.fallback_used)
            }
            None => (None, false),
        };

        if outcome.truncated {
            warn!(model = %outcome.model, segments = outcome.segments, "Generation truncated after max segments");
        }
        info!(
            model = %outcome.model,
            segments = outcome.segments,
            truncated = outcome.truncated,
            schema_fallback_used,
            attempts = selector.attempts().len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation completed"
        );

        Ok(GenerationResult {
            text: outcome.text,
            structured,
            model: outcome.model,
            continuation_used: outcome.continuation_used,
            segments: outcome.segments,
            truncated: outcome.truncated,
            schema_fallback_used,
            attempts: selector.into_attempts(),
        })
    }
}
