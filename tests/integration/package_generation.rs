//! Package generation across the built-in formats

use crate::integration::test_utils::fast_policy;
use async_trait::async_trait;
use quill::error::CallError;
use quill::formats::{ContentFormat, DEFAULT_SYSTEM_PROMPT};
use quill::generation::{generate_package, GenerationOrchestrator, PackageOutcome, PackagePiece};
use quill::provider::{CallRequest, GenerativeBackend};
use quill::GenerationError;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Answers every known model with text that satisfies all format sections;
/// unknown models get a 404.
struct SectionsBackend {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SectionsBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl GenerativeBackend for SectionsBackend {
    async fn call(&self, request: &CallRequest) -> Result<Value, CallError> {
        if request.model == "missing" {
            return Err(CallError::with_status(404, "model_not_found"));
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let labels = ContentFormat::ALL
            .iter()
            .flat_map(|f| f.required_sections().iter())
            .map(|label| format!("## {}\ncontent", label))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(json!({ "output_text": labels }))
    }

    fn backend_name(&self) -> &str {
        "sections"
    }
}

fn pieces(failing: Option<ContentFormat>) -> Vec<PackagePiece> {
    ContentFormat::ALL
        .iter()
        .map(|format| {
            let model = if Some(*format) == failing { "missing" } else { "gpt-5-mini" };
            PackagePiece::new(
                format.key(),
                format.request(vec![model.to_string()], DEFAULT_SYSTEM_PROMPT, "Theme: sleep", false),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_package_preserves_order() {
    let backend = SectionsBackend::new();
    let orchestrator = GenerationOrchestrator::new(backend.clone()).with_policy(fast_policy());

    let report = generate_package(&orchestrator, pieces(None), 3, CancellationToken::new())
        .await
        .unwrap();

    let keys: Vec<&str> = report.outcomes.iter().map(|o| o.key()).collect();
    assert_eq!(keys, vec!["reels", "post", "carousel", "live", "stories"]);
    assert_eq!(report.total_generated, 5);
    assert_eq!(report.total_failed, 0);
    assert!(backend.peak.load(Ordering::SeqCst) <= 3);
    for outcome in &report.outcomes {
        let result = outcome.result().unwrap();
        assert_eq!(result.segments, 1);
        assert!(!result.truncated);
    }
}

#[tokio::test]
async fn test_failed_piece_does_not_affect_others() {
    let backend = SectionsBackend::new();
    let orchestrator = GenerationOrchestrator::new(backend).with_policy(fast_policy());

    let report = generate_package(
        &orchestrator,
        pieces(Some(ContentFormat::Carousel)),
        2,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(report.total_generated, 4);
    assert_eq!(report.total_failed, 1);
    match &report.outcomes[2] {
        PackageOutcome::Failed {
            key,
            error,
            cancelled,
        } => {
            assert_eq!(key, "carousel");
            assert!(error.contains("No model available"));
            assert!(!cancelled);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_cancelled_package_marks_pieces_cancelled() {
    let backend = SectionsBackend::new();
    let orchestrator = GenerationOrchestrator::new(backend).with_policy(fast_policy());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = generate_package(&orchestrator, pieces(None), 2, cancel)
        .await
        .unwrap();

    assert_eq!(report.total_generated, 0);
    assert!(report
        .outcomes
        .iter()
        .all(|o| matches!(o, PackageOutcome::Failed { cancelled: true, .. })));
}

#[tokio::test]
async fn test_zero_concurrency_is_rejected() {
    let orchestrator = GenerationOrchestrator::new(SectionsBackend::new());
    let err = generate_package(&orchestrator, pieces(None), 0, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerationError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_report_serializes_with_status_tags() {
    let orchestrator = GenerationOrchestrator::new(SectionsBackend::new()).with_policy(fast_policy());
    let report = generate_package(
        &orchestrator,
        pieces(Some(ContentFormat::Stories)),
        5,
        CancellationToken::new(),
    )
    .await
    .unwrap();

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["outcomes"][0]["status"], "generated");
    assert_eq!(value["outcomes"][4]["status"], "failed");
    assert_eq!(value["total_failed"], 1);
}
