use crate::error::GenerationError;
use crate::generation::classify::FailureKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const DEFAULT_MAX_SEGMENTS: u32 = 6;
pub const DEFAULT_TOKEN_BUDGET: u32 = 2500;
pub const DEFAULT_CONTINUATION_MARKER: &str = "<CONTINUE>";

/// Optional per-call fields (sampling parameters and the like), keyed by wire name.
///
/// Ordered so that request bodies and attempt logs are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionalParams(BTreeMap<String, Value>);

impl OptionalParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Copy of these params with one field dropped.
    pub fn without(&self, field: &str) -> Self {
        let mut next = self.0.clone();
        next.remove(field);
        Self(next)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

/// Structured output contract: a name plus a JSON-schema style description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSchema {
    pub name: String,
    pub schema: Value,
}

impl OutputSchema {
    pub fn new(name: impl Into<String>, schema: Value) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// How the segmented generator decides that accumulated output is finished.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "sections", rename_all = "snake_case")]
pub enum Completeness {
    /// Complete when the output does not end with the continuation marker.
    #[default]
    MarkerAbsent,
    /// Complete when every listed section label appears in the output.
    RequiredSections(Vec<String>),
}

/// A fully formed content request handed to the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Acceptable models, most preferred first
    pub model_candidates: Vec<String>,
    pub system: String,
    pub turns: Vec<String>,
    #[serde(default)]
    pub schema: Option<OutputSchema>,
    #[serde(default)]
    pub params: OptionalParams,
    /// Output token budget for every individual call
    pub token_budget: u32,
    /// Upper bound on calls that contribute text, including the first
    pub max_segments: u32,
    #[serde(default)]
    pub completeness: Completeness,
    pub continuation_marker: String,
}

impl GenerationRequest {
    pub fn new(model_candidates: Vec<String>, system: impl Into<String>) -> Self {
        Self {
            model_candidates,
            system: system.into(),
            turns: Vec::new(),
            schema: None,
            params: OptionalParams::default(),
            token_budget: DEFAULT_TOKEN_BUDGET,
            max_segments: DEFAULT_MAX_SEGMENTS,
            completeness: Completeness::MarkerAbsent,
            continuation_marker: DEFAULT_CONTINUATION_MARKER.to_string(),
        }
    }

    pub fn turn(mut self, text: impl Into<String>) -> Self {
        self.turns.push(text.into());
        self
    }

    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_params(mut self, params: OptionalParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_token_budget(mut self, token_budget: u32) -> Self {
        self.token_budget = token_budget;
        self
    }

    pub fn with_max_segments(mut self, max_segments: u32) -> Self {
        self.max_segments = max_segments;
        self
    }

    pub fn with_completeness(mut self, completeness: Completeness) -> Self {
        self.completeness = completeness;
        self
    }

    pub fn with_continuation_marker(mut self, marker: impl Into<String>) -> Self {
        self.continuation_marker = marker.into();
        self
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.model_candidates.is_empty() {
            return Err(GenerationError::InvalidRequest(
                "At least one model candidate is required".to_string(),
            ));
        }
        if self.model_candidates.iter().any(|m| m.trim().is_empty()) {
            return Err(GenerationError::InvalidRequest(
                "Model candidate names cannot be empty".to_string(),
            ));
        }
        if self.token_budget == 0 {
            return Err(GenerationError::InvalidRequest(
                "Token budget must be greater than zero".to_string(),
            ));
        }
        if self.max_segments == 0 {
            return Err(GenerationError::InvalidRequest(
                "max_segments must be at least 1".to_string(),
            ));
        }
        if self.continuation_marker.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "Continuation marker cannot be empty".to_string(),
            ));
        }
        if let Completeness::RequiredSections(sections) = &self.completeness {
            if sections.is_empty() || sections.iter().any(|s| s.trim().is_empty()) {
                return Err(GenerationError::InvalidRequest(
                    "Required sections must be a non-empty list of non-empty labels".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failure { kind: FailureKind },
}

/// One call attempt: which model, with which optional params, and how it ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub model: String,
    pub params: OptionalParams,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

impl AttemptRecord {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Success)
    }

    pub fn failure_kind(&self) -> Option<&FailureKind> {
        match &self.outcome {
            AttemptOutcome::Success => None,
            AttemptOutcome::Failure { kind } => Some(kind),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResult {
    pub text: String,
    pub structured: Option<Value>,
    /// Model that produced the final segment
    pub model: String,
    pub continuation_used: bool,
    pub segments: u32,
    /// Segment bound reached before the output was judged complete
    pub truncated: bool,
    pub schema_fallback_used: bool,
    #[serde(default)]
    pub attempts: Vec<AttemptRecord>,
}
