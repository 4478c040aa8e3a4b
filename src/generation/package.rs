//! Package generation: several independent pieces, bounded concurrency.
//!
//! Each piece is a full orchestration of its own. Pieces share nothing but the
//! orchestrator handle, so a failure in one is recorded and the rest continue.

use crate::error::GenerationError;
use crate::generation::orchestrator::GenerationOrchestrator;
use crate::generation::request::{GenerationRequest, GenerationResult};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// One piece of a package, identified by a caller-chosen key (e.g. a format name).
#[derive(Debug, Clone)]
pub struct PackagePiece {
    pub key: String,
    pub request: GenerationRequest,
}

impl PackagePiece {
    pub fn new(key: impl Into<String>, request: GenerationRequest) -> Self {
        Self {
            key: key.into(),
            request,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PackageOutcome {
    Generated {
        key: String,
        result: GenerationResult,
    },
    Failed {
        key: String,
        error: String,
        cancelled: bool,
    },
}

impl PackageOutcome {
    pub fn key(&self) -> &str {
        match self {
            PackageOutcome::Generated { key, .. } | PackageOutcome::Failed { key, .. } => key,
        }
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        match self {
            PackageOutcome::Generated { result, .. } => Some(result),
            PackageOutcome::Failed { .. } => None,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, PackageOutcome::Generated { .. })
    }
}

/// Outcomes in input order, with totals.
#[derive(Debug, Serialize)]
pub struct PackageReport {
    pub outcomes: Vec<PackageOutcome>,
    pub total_generated: usize,
    pub total_failed: usize,
}

/// Generate every piece, at most `concurrency` at a time.
pub async fn generate_package(
    orchestrator: &GenerationOrchestrator,
    pieces: Vec<PackagePiece>,
    concurrency: usize,
    cancel: CancellationToken,
) -> Result<PackageReport, GenerationError> {
    if concurrency == 0 {
        return Err(GenerationError::InvalidRequest(
            "Package concurrency must be at least 1".to_string(),
        ));
    }

    let total = pieces.len();
    info!(pieces = total, concurrency, "Package generation started");

    let outcomes: Vec<PackageOutcome> = stream::iter(pieces)
        .map(|piece| {
            let cancel = cancel.clone();
            async move {
                let key = piece.key;
                match orchestrator.generate_with_cancel(piece.request, cancel).await {
                    Ok(result) => {
                        info!(key = %key, model = %result.model, segments = result.segments, "Package piece generated");
                        PackageOutcome::Generated { key, result }
                    }
                    Err(err) => {
                        error!(key = %key, error = %err, "Package piece failed");
                        PackageOutcome::Failed {
                            cancelled: matches!(err, GenerationError::Cancelled),
                            error: err.to_string(),
                            key,
                        }
                    }
                }
            }
        })
        .buffered(concurrency)
        .collect()
        .await;

    let total_generated = outcomes.iter().filter(|o| o.is_generated()).count();
    let total_failed = total - total_generated;
    info!(total_generated, total_failed, "Package generation completed");

    Ok(PackageReport {
        outcomes,
        total_generated,
        total_failed,
    })
}
