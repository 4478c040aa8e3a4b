//! Error types for the quill generation orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure signal from a single call against the generative service.
///
/// Carries only what classification needs: the provider's message text and the
/// HTTP status, when the failure came from a response rather than the transport.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct CallError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl CallError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
        }
    }

    /// Error produced when a call exceeds its deadline.
    pub fn timed_out(after: std::time::Duration) -> Self {
        Self::new(format!("Request timed out after {}ms", after.as_millis()))
    }
}

/// Errors surfaced to callers of the orchestrator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid generation request: {0}")]
    InvalidRequest(String),

    #[error("No model available after trying {attempted} candidate(s); last failure: {last}")]
    NoModelAvailable { attempted: usize, last: CallError },

    #[error("Model {model} returned no usable text")]
    EmptyOutput { model: String },

    #[error("Generation failed on model {model}: {source}")]
    Fatal {
        model: String,
        #[source]
        source: CallError,
    },

    #[error("Generation cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

impl GenerationError {
    /// Whether the error was caused by the caller rather than the service.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            GenerationError::InvalidRequest(_) | GenerationError::ConfigError(_)
        )
    }
}

impl From<config::ConfigError> for GenerationError {
    fn from(err: config::ConfigError) -> Self {
        GenerationError::ConfigError(err.to_string())
    }
}
