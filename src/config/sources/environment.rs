//! Environment source: `QUILL__SECTION__KEY` variables, plus the `QUILL_MODEL` shortcut.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

pub const ENV_PREFIX: &str = "QUILL";
pub const MODEL_ENV: &str = "QUILL_MODEL";

/// Add `QUILL__GENERATION__TOKEN_BUDGET=4000` style overrides.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("generation.model_candidates"),
    ))
}

/// Put the model named by `QUILL_MODEL` first, removing any later duplicate.
pub fn apply_model_override(candidates: &mut Vec<String>) {
    let Some(model) = std::env::var(MODEL_ENV)
        .ok()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
    else {
        return;
    };
    candidates.retain(|c| c != &model);
    candidates.insert(0, model);
}
