//! Provider profile: endpoint, credentials source and wire style for the HTTP backend.

use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Which request/response family the endpoint speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStyle {
    /// `POST {base}/responses` with `input` items
    #[default]
    Responses,
    /// `POST {base}/chat/completions` with `messages`
    ChatCompletions,
}

impl ApiStyle {
    pub fn path(&self) -> &'static str {
        match self {
            ApiStyle::Responses => "responses",
            ApiStyle::ChatCompletions => "chat/completions",
        }
    }

    /// Wire name of the output token limit for this style
    pub fn default_token_field(&self) -> &'static str {
        match self {
            ApiStyle::Responses => "max_output_tokens",
            ApiStyle::ChatCompletions => "max_completion_tokens",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key; never the key itself
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default)]
    pub api_style: ApiStyle,

    /// Override for the token limit field name
    #[serde(default)]
    pub token_budget_field: Option<String>,

    /// Ask the service to enforce the output schema natively
    #[serde(default)]
    pub structured_output: bool,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            api_style: ApiStyle::default(),
            token_budget_field: None,
            structured_output: false,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "Base URL must start with http:// or https://: {}",
                self.base_url
            ));
        }
        if self.api_key_env.trim().is_empty() {
            return Err("api_key_env cannot be empty".to_string());
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err("Provider timeouts must be greater than zero".to_string());
        }
        if let Some(field) = &self.token_budget_field {
            if field.trim().is_empty() {
                return Err("token_budget_field cannot be empty when set".to_string());
            }
        }
        Ok(())
    }

    pub fn token_field(&self) -> &str {
        self.token_budget_field
            .as_deref()
            .unwrap_or_else(|| self.api_style.default_token_field())
    }

    /// Whether the base URL points at the hosted OpenAI API
    pub fn is_hosted(&self) -> bool {
        self.base_url.trim_end_matches('/') == DEFAULT_BASE_URL
    }

    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_style.path()
        )
    }
}
