//! Merge rules: defaults, override order, conflict handling.

use crate::generation::invoker::{DEFAULT_MAX_TRANSIENT_RETRIES, DEFAULT_RETRY_BASE_DELAY};
use crate::generation::request::{
    DEFAULT_CONTINUATION_MARKER, DEFAULT_MAX_SEGMENTS, DEFAULT_TOKEN_BUDGET,
};
use crate::provider::profile::{DEFAULT_API_KEY_ENV, DEFAULT_BASE_URL};
use config::builder::DefaultState;
use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Model candidates tried when nothing else is configured, most preferred first.
pub const DEFAULT_MODEL_CANDIDATES: &[&str] = &["gpt-5-mini", "gpt-4o-mini", "gpt-4.1-mini"];

/// Create a Config builder with merge policy defaults applied.
///
/// Lists are replaced wholesale by later sources, never appended, so a workspace
/// `model_candidates` fully overrides the global one.
pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("provider.base_url", DEFAULT_BASE_URL)?
        .set_default("provider.api_key_env", DEFAULT_API_KEY_ENV)?
        .set_default(
            "generation.model_candidates",
            DEFAULT_MODEL_CANDIDATES
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>(),
        )?
        .set_default("generation.token_budget", DEFAULT_TOKEN_BUDGET as i64)?
        .set_default("generation.max_segments", DEFAULT_MAX_SEGMENTS as i64)?
        .set_default("generation.continuation_marker", DEFAULT_CONTINUATION_MARKER)?
        .set_default(
            "generation.max_transient_retries",
            DEFAULT_MAX_TRANSIENT_RETRIES as i64,
        )?
        .set_default(
            "generation.retry_base_delay_ms",
            DEFAULT_RETRY_BASE_DELAY.as_millis() as i64,
        )?
        .set_default("logging.output", "stderr")
}
