//! CLI output: error mapping from domain errors to stable CLI surface.

use crate::error::GenerationError;

/// Map domain/service errors to a string for CLI output, with a hint where one helps.
pub fn map_error(e: &GenerationError) -> String {
    match e {
        GenerationError::NoModelAvailable { .. } => format!(
            "{}\nHint: check generation.model_candidates or set QUILL_MODEL to a model your key can use.",
            e
        ),
        GenerationError::ProviderError(_) => format!(
            "{}\nHint: set the API key variable named by provider.api_key_env, or point provider.base_url at a local server.",
            e
        ),
        _ => e.to_string(),
    }
}
