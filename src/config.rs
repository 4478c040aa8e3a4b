//! Configuration System
//!
//! Layered configuration for the generation engine: merge-policy defaults, the global
//! config file, workspace config files, then environment overrides. Validation runs
//! after loading and reports every problem at once.

use crate::error::GenerationError;
use crate::formats::DEFAULT_SYSTEM_PROMPT;
use crate::generation::invoker::{
    InvokePolicy, DEFAULT_CALL_TIMEOUT, DEFAULT_MAX_TRANSIENT_RETRIES, DEFAULT_RETRY_BASE_DELAY,
};
use crate::generation::request::{
    OptionalParams, DEFAULT_CONTINUATION_MARKER, DEFAULT_MAX_SEGMENTS, DEFAULT_TOKEN_BUDGET,
};
use crate::logging::LoggingConfig;
use crate::provider::ProviderConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod merge;
mod sources;

pub use merge::merge_policy::DEFAULT_MODEL_CANDIDATES;
pub use sources::environment::MODEL_ENV;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuillConfig {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub generation: GenerationDefaults,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Defaults applied to every request the CLI builds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationDefaults {
    #[serde(default = "default_model_candidates")]
    pub model_candidates: Vec<String>,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_token_budget")]
    pub token_budget: u32,

    #[serde(default = "default_max_segments")]
    pub max_segments: u32,

    #[serde(default = "default_continuation_marker")]
    pub continuation_marker: String,

    /// Sampling temperature sent when set; stripped automatically for models that reject it
    #[serde(default = "default_temperature")]
    pub temperature: Option<f64>,

    /// Set to false to never send a temperature (TOML has no null to clear it)
    #[serde(default = "default_true")]
    pub send_temperature: bool,

    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,

    #[serde(default = "default_max_transient_retries")]
    pub max_transient_retries: u32,

    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Pieces generated at once by `quill package`
    #[serde(default = "default_package_concurrency")]
    pub package_concurrency: usize,

    /// Request JSON output validated against the format schema
    #[serde(default)]
    pub structured: bool,
}

fn default_model_candidates() -> Vec<String> {
    DEFAULT_MODEL_CANDIDATES
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_token_budget() -> u32 {
    DEFAULT_TOKEN_BUDGET
}

fn default_max_segments() -> u32 {
    DEFAULT_MAX_SEGMENTS
}

fn default_continuation_marker() -> String {
    DEFAULT_CONTINUATION_MARKER.to_string()
}

fn default_temperature() -> Option<f64> {
    Some(0.6)
}

fn default_true() -> bool {
    true
}

fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT.as_secs()
}

fn default_max_transient_retries() -> u32 {
    DEFAULT_MAX_TRANSIENT_RETRIES
}

fn default_retry_base_delay_ms() -> u64 {
    DEFAULT_RETRY_BASE_DELAY.as_millis() as u64
}

fn default_package_concurrency() -> usize {
    2
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            model_candidates: default_model_candidates(),
            system_prompt: default_system_prompt(),
            token_budget: default_token_budget(),
            max_segments: default_max_segments(),
            continuation_marker: default_continuation_marker(),
            temperature: default_temperature(),
            send_temperature: true,
            call_timeout_secs: default_call_timeout_secs(),
            max_transient_retries: default_max_transient_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            package_concurrency: default_package_concurrency(),
            structured: false,
        }
    }
}

impl GenerationDefaults {
    pub fn validate(&self) -> Result<(), String> {
        if self.model_candidates.is_empty() {
            return Err("model_candidates must name at least one model".to_string());
        }
        if self.model_candidates.iter().any(|m| m.trim().is_empty()) {
            return Err("model_candidates cannot contain empty names".to_string());
        }
        if self.token_budget == 0 {
            return Err("token_budget must be greater than zero".to_string());
        }
        if self.max_segments == 0 {
            return Err("max_segments must be at least 1".to_string());
        }
        if self.continuation_marker.trim().is_empty() {
            return Err("continuation_marker cannot be empty".to_string());
        }
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "temperature must be between 0.0 and 2.0, got {}",
                    temperature
                ));
            }
        }
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be greater than zero".to_string());
        }
        if self.package_concurrency == 0 {
            return Err("package_concurrency must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn invoke_policy(&self) -> InvokePolicy {
        InvokePolicy {
            call_timeout: Duration::from_secs(self.call_timeout_secs),
            max_transient_retries: self.max_transient_retries,
            retry_base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }

    /// Optional params sent with every call
    pub fn params(&self) -> OptionalParams {
        let mut params = OptionalParams::new();
        if let (true, Some(temperature)) = (self.send_temperature, self.temperature) {
            params.insert("temperature", temperature);
        }
        params
    }
}

/// Configuration validation errors
#[derive(Debug, Clone)]
pub enum ValidationError {
    Provider(String),
    Generation(String),
    Logging(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Provider(msg) => write!(f, "Provider: {}", msg),
            ValidationError::Generation(msg) => write!(f, "Generation: {}", msg),
            ValidationError::Logging(msg) => write!(f, "Logging: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl QuillConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.provider.validate() {
            errors.push(ValidationError::Provider(e));
        }
        if let Err(e) = self.generation.validate() {
            errors.push(ValidationError::Generation(e));
        }
        if let Err(e) = self.logging.validate() {
            errors.push(ValidationError::Logging(e));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate, folding every problem into one error.
    pub fn validated(self) -> Result<Self, GenerationError> {
        self.validate().map_err(|errors| {
            let error_msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            GenerationError::ConfigError(format!(
                "Configuration validation failed:\n{}",
                error_msgs.join("\n")
            ))
        })?;
        Ok(self)
    }

    pub fn to_toml_string(&self) -> Result<String, GenerationError> {
        toml::to_string_pretty(self).map_err(|e| {
            GenerationError::ConfigError(format!("Failed to serialize configuration: {}", e))
        })
    }
}

/// Loads [`QuillConfig`] from layered sources
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, `config/quill.toml`,
    /// `config/{QUILL_ENV}.toml`, `QUILL__SECTION__KEY` variables. `QUILL_MODEL`
    /// then moves its model to the front of the candidate list.
    pub fn load(workspace_root: &Path) -> Result<QuillConfig, GenerationError> {
        let builder = merge::merge_policy::builder_with_defaults()?;
        let builder = sources::global_file::add_to_builder(builder)?;
        let builder = sources::workspace_file::add_to_builder(builder, workspace_root)?;
        let builder = sources::environment::add_to_builder(builder)?;

        let mut config: QuillConfig = builder.build()?.try_deserialize()?;
        sources::environment::apply_model_override(&mut config.generation.model_candidates);
        Ok(config)
    }

    /// Load configuration from one explicit file, ignoring the other file sources.
    pub fn load_from_file(path: &Path) -> Result<QuillConfig, GenerationError> {
        if !path.exists() {
            return Err(GenerationError::ConfigError(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let builder = merge::merge_policy::builder_with_defaults()?
            .add_source(config::File::from(path).required(true));
        let builder = sources::environment::add_to_builder(builder)?;

        let mut config: QuillConfig = builder.build()?.try_deserialize()?;
        sources::environment::apply_model_override(&mut config.generation.model_candidates);
        Ok(config)
    }

    /// Path of the global config file, when a home directory can be found
    pub fn global_config_path() -> Option<PathBuf> {
        sources::global_file::global_config_path()
    }

    /// Write the default configuration to `path`, refusing to overwrite unless `force`.
    pub fn write_default(path: &Path, force: bool) -> Result<(), GenerationError> {
        if path.exists() && !force {
            return Err(GenerationError::ConfigError(format!(
                "Configuration file already exists: {} (use --force to overwrite)",
                path.display()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                GenerationError::ConfigError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
        let content = QuillConfig::default().to_toml_string()?;
        std::fs::write(path, content).map_err(|e| {
            GenerationError::ConfigError(format!(
                "Failed to write configuration {}: {}",
                path.display(),
                e
            ))
        })
    }
}
