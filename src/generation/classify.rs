//! Failure classification for single call attempts.
//!
//! All message matching that drives retry and fallback decisions lives here so the
//! rules stay in one place and can be tested without a backend.

use crate::error::CallError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// What a failed attempt means for the next step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The model rejected one optional field; the same model may succeed without it.
    UnsupportedParameter { field: String },
    /// Unknown model or no access; another candidate may work.
    ModelUnavailable,
    /// Network, timeout, or overload; worth a bounded retry.
    Transient,
    Fatal,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::UnsupportedParameter { .. } => "unsupported_parameter",
            FailureKind::ModelUnavailable => "model_unavailable",
            FailureKind::Transient => "transient",
            FailureKind::Fatal => "fatal",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::UnsupportedParameter { field } => {
                write!(f, "unsupported_parameter({})", field)
            }
            other => f.write_str(other.label()),
        }
    }
}

const TRANSIENT_STATUSES: &[u16] = &[408, 409, 425, 429, 500, 502, 503, 504];

fn unsupported_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)unsupported (?:value|parameter):\s*'([A-Za-z_][A-Za-z0-9_.]*)'",
            r"(?i)does not support (?:the )?(?:parameter )?'([A-Za-z_][A-Za-z0-9_.]*)'",
            r"(?i)does not support (?:a custom |custom )?(temperature|top_p|presence_penalty|frequency_penalty|seed|logprobs|stop)\b",
            r"(?i)'([A-Za-z_][A-Za-z0-9_.]*)' is not supported with this model",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static pattern compiles"))
        .collect()
    })
}

fn model_unavailable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)(model\b.*\b(does not exist|not found|is not available)|model_not_found|do(es)? not have access|no access to model)",
        )
        .expect("static pattern compiles")
    })
}

fn transient_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)(timed out|timeout|connection (error|refused|reset|closed)|connect error|network|temporarily unavailable|overloaded|rate limit|econnreset|broken pipe)",
        )
        .expect("static pattern compiles")
    })
}

/// Name of the optional field a failure message says the model rejected.
pub fn rejected_field(message: &str) -> Option<String> {
    unsupported_patterns()
        .iter()
        .find_map(|re| re.captures(message))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Label a failed call. Pure; the order of checks is part of the contract.
pub fn classify(error: &CallError) -> FailureKind {
    if let Some(field) = rejected_field(&error.message) {
        return FailureKind::UnsupportedParameter { field };
    }
    if error.status == Some(404) || model_unavailable_pattern().is_match(&error.message) {
        return FailureKind::ModelUnavailable;
    }
    if error
        .status
        .is_some_and(|status| TRANSIENT_STATUSES.contains(&status))
        || transient_pattern().is_match(&error.message)
    {
        return FailureKind::Transient;
    }
    FailureKind::Fatal
}
