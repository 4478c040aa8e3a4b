//! The OpenAI-compatible backend against a local canned HTTP server

use crate::integration::test_utils::{fast_policy, request, serve_responses, CannedResponse};
use quill::generation::request::OptionalParams;
use quill::generation::GenerationOrchestrator;
use quill::provider::{ApiStyle, OpenAiBackend, ProviderConfig};
use quill::GenerationError;
use serde_json::json;
use std::sync::Arc;

fn backend(base_url: String, api_style: ApiStyle) -> Arc<OpenAiBackend> {
    let config = ProviderConfig {
        base_url,
        api_style,
        connect_timeout_secs: 2,
        request_timeout_secs: 5,
        ..ProviderConfig::default()
    };
    Arc::new(OpenAiBackend::new(config, Some("test-key".to_string())).unwrap())
}

#[tokio::test]
async fn test_responses_style_round_trip() {
    let (base_url, server) = serve_responses(vec![CannedResponse::ok(json!({
        "output": [{"type": "message", "content": [{"type": "output_text", "text": "Served"}]}]
    }))])
    .await;

    let orchestrator =
        GenerationOrchestrator::new(backend(base_url, ApiStyle::Responses)).with_policy(fast_policy());
    let result = orchestrator
        .generate(request(&["gpt-5-mini"]).with_token_budget(900))
        .await
        .unwrap();
    assert_eq!(result.text, "Served");

    let bodies = server.await.unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["model"], "gpt-5-mini");
    assert_eq!(bodies[0]["max_output_tokens"], 900);
    assert_eq!(bodies[0]["input"][0]["role"], "developer");
    assert_eq!(bodies[0]["input"][1]["role"], "user");
}

#[tokio::test]
async fn test_rejected_parameter_is_dropped_over_http() {
    let (base_url, server) = serve_responses(vec![
        CannedResponse::error(
            400,
            "Unsupported parameter: 'temperature' is not supported with this model.",
        ),
        CannedResponse::ok(json!({"output_text": "Without temperature"})),
    ])
    .await;

    let orchestrator =
        GenerationOrchestrator::new(backend(base_url, ApiStyle::Responses)).with_policy(fast_policy());
    let result = orchestrator
        .generate(request(&["gpt-5-mini"]).with_params(OptionalParams::new().with("temperature", 0.6)))
        .await
        .unwrap();
    assert_eq!(result.text, "Without temperature");

    let bodies = server.await.unwrap();
    assert_eq!(bodies[0]["temperature"], 0.6);
    assert!(bodies[1].get("temperature").is_none());
    assert_eq!(bodies[1]["model"], "gpt-5-mini");
}

#[tokio::test]
async fn test_chat_completions_fallback_over_http() {
    let (base_url, server) = serve_responses(vec![
        CannedResponse::error(404, "The model `llama-huge` does not exist"),
        CannedResponse::ok(json!({
            "choices": [{"message": {"role": "assistant", "content": "Local answer"}}]
        })),
    ])
    .await;

    let orchestrator = GenerationOrchestrator::new(backend(base_url, ApiStyle::ChatCompletions))
        .with_policy(fast_policy());
    let result = orchestrator
        .generate(request(&["llama-huge", "llama3.1"]))
        .await
        .unwrap();
    assert_eq!(result.text, "Local answer");
    assert_eq!(result.model, "llama3.1");

    let bodies = server.await.unwrap();
    assert_eq!(bodies[0]["model"], "llama-huge");
    assert_eq!(bodies[1]["model"], "llama3.1");
    assert_eq!(bodies[1]["messages"][0]["role"], "system");
    assert_eq!(bodies[1]["stream"], false);
}

#[tokio::test]
async fn test_auth_failure_is_fatal_over_http() {
    let (base_url, server) =
        serve_responses(vec![CannedResponse::error(401, "Incorrect API key provided")]).await;

    let orchestrator =
        GenerationOrchestrator::new(backend(base_url, ApiStyle::Responses)).with_policy(fast_policy());
    let err = orchestrator
        .generate(request(&["gpt-5-mini", "gpt-4o-mini"]))
        .await
        .unwrap_err();
    match err {
        GenerationError::Fatal { model, source } => {
            assert_eq!(model, "gpt-5-mini");
            assert_eq!(source.status, Some(401));
            assert_eq!(source.message, "Incorrect API key provided");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(server.await.unwrap().len(), 1);
}
