//! Generative Call Boundary
//!
//! The one seam between the orchestrator and the external generative-text service.
//! A backend performs exactly one call and hands back the raw, shape-varying response
//! payload; classification, retries, fallback and extraction all happen above it.

use crate::error::{CallError, GenerationError};
use crate::generation::request::{OptionalParams, OutputSchema};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

pub mod openai;
pub mod profile;
pub mod replay;

pub use openai::OpenAiBackend;
pub use profile::{ApiStyle, ProviderConfig};
pub use replay::{ReplayBackend, ReplayStep};

/// Everything a backend needs for a single call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRequest {
    pub model: String,
    pub system: String,
    pub turns: Vec<String>,
    pub token_budget: u32,
    #[serde(default)]
    pub params: OptionalParams,
    #[serde(default)]
    pub schema: Option<OutputSchema>,
}

/// Generative service client trait
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Perform one call and return the raw response payload
    async fn call(&self, request: &CallRequest) -> Result<Value, CallError>;

    /// Get the backend name (for logs)
    fn backend_name(&self) -> &str;
}

#[async_trait]
impl<T: GenerativeBackend + ?Sized> GenerativeBackend for Arc<T> {
    async fn call(&self, request: &CallRequest) -> Result<Value, CallError> {
        (**self).call(request).await
    }

    fn backend_name(&self) -> &str {
        (**self).backend_name()
    }
}

/// Backend factory for building a backend from configuration
pub struct BackendFactory;

impl BackendFactory {
    pub fn create(config: &ProviderConfig) -> Result<Arc<dyn GenerativeBackend>, GenerationError> {
        config.validate().map_err(GenerationError::ConfigError)?;
        Ok(Arc::new(OpenAiBackend::from_config(config)?))
    }

    /// Backend that replays recorded responses from a JSON script file.
    pub fn replay(path: &std::path::Path) -> Result<Arc<dyn GenerativeBackend>, GenerationError> {
        Ok(Arc::new(ReplayBackend::from_file(path)?))
    }
}
