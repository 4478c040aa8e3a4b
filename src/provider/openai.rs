//! OpenAI-compatible HTTP backend (hosted OpenAI, Ollama, vLLM, llama.cpp servers).

use crate::error::{CallError, GenerationError};
use crate::provider::profile::{ApiStyle, ProviderConfig};
use crate::provider::{CallRequest, GenerativeBackend};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Body keys owned by the backend; optional params never overwrite them.
const RESERVED_FIELDS: &[&str] = &["model", "input", "messages", "stream"];

// Helper function to map transport errors to CallError
fn map_http_error(error: reqwest::Error) -> CallError {
    let status = error.status().map(|s| s.as_u16());
    let message = if error.is_timeout() {
        format!("Request timeout: {}", error)
    } else if error.is_connect() {
        format!("Connection error: {}", error)
    } else if error.is_request() {
        format!("Network error: {}", error)
    } else {
        format!("HTTP error: {}", error)
    };
    CallError { message, status }
}

/// Pull the human-readable message out of an error body, falling back to the raw text.
fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .pointer("/error/message")
                .or_else(|| value.get("message"))
                .or_else(|| value.get("error"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .filter(|message| !message.trim().is_empty())
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                "Unknown error".to_string()
            } else {
                body.to_string()
            }
        })
}

fn build_http_client(config: &ProviderConfig) -> Result<Client, GenerationError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| GenerationError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

pub struct OpenAiBackend {
    client: Client,
    config: ProviderConfig,
    api_key: Option<String>,
}

impl OpenAiBackend {
    pub fn new(config: ProviderConfig, api_key: Option<String>) -> Result<Self, GenerationError> {
        let client = build_http_client(&config)?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    /// Build from config, reading the key from the configured environment variable.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, GenerationError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());
        if api_key.is_none() {
            if config.is_hosted() {
                return Err(GenerationError::ProviderError(format!(
                    "{} is not set; the hosted API requires a key",
                    config.api_key_env
                )));
            }
            warn!(
                api_key_env = %config.api_key_env,
                base_url = %config.base_url,
                "No API key found; sending unauthenticated requests"
            );
        }
        Self::new(config.clone(), api_key)
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Serialize one call into the request body for the configured style.
    pub fn build_body(&self, request: &CallRequest) -> Value {
        let mut body = Map::new();
        body.insert("model".to_string(), json!(request.model));

        match self.config.api_style {
            ApiStyle::Responses => {
                let mut input = vec![json!({"role": "developer", "content": request.system})];
                input.extend(
                    request
                        .turns
                        .iter()
                        .map(|turn| json!({"role": "user", "content": turn})),
                );
                body.insert("input".to_string(), Value::Array(input));
            }
            ApiStyle::ChatCompletions => {
                let mut messages = vec![json!({"role": "system", "content": request.system})];
                messages.extend(
                    request
                        .turns
                        .iter()
                        .map(|turn| json!({"role": "user", "content": turn})),
                );
                body.insert("messages".to_string(), Value::Array(messages));
                body.insert("stream".to_string(), json!(false));
            }
        }

        body.insert(
            self.config.token_field().to_string(),
            json!(request.token_budget),
        );

        if let (true, Some(schema)) = (self.config.structured_output, &request.schema) {
            match self.config.api_style {
                ApiStyle::Responses => {
                    body.insert(
                        "text".to_string(),
                        json!({"format": {
                            "type": "json_schema",
                            "name": schema.name,
                            "schema": schema.schema,
                        }}),
                    );
                }
                ApiStyle::ChatCompletions => {
                    body.insert(
                        "response_format".to_string(),
                        json!({"type": "json_schema", "json_schema": {
                            "name": schema.name,
                            "schema": schema.schema,
                        }}),
                    );
                }
            }
        }

        for (field, value) in request.params.iter() {
            if RESERVED_FIELDS.contains(&field.as_str()) {
                continue;
            }
            body.insert(field.clone(), value.clone());
        }

        Value::Object(body)
    }
}

#[async_trait]
impl GenerativeBackend for OpenAiBackend {
    async fn call(&self, request: &CallRequest) -> Result<Value, CallError> {
        let url = self.config.endpoint();
        let body = self.build_body(request);

        debug!(
            url = %url,
            model = %request.model,
            turns = request.turns.len(),
            params = request.params.len(),
            "Sending provider request"
        );

        let mut builder = self
            .client
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(api_key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = builder.json(&body).send().await.map_err(map_http_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CallError::with_status(
                status.as_u16(),
                error_message_from_body(&error_text),
            ));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| CallError::new(format!("Failed to parse response: {}", e)))
    }

    fn backend_name(&self) -> &str {
        "openai-compatible"
    }
}
