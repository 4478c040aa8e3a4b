//! Structured output: parse model text as JSON and check it against a schema.
//!
//! Only the structural subset of JSON Schema that content schemas use is checked:
//! `type`, `properties`, `required`, `additionalProperties`, `items`, `minItems`,
//! `maxItems`, `enum` and `anyOf`. This step never fails; output that does not
//! parse or validate is wrapped in a fallback object that keeps the raw text.

use crate::generation::request::OutputSchema;
use serde_json::{json, Map, Value};
use tracing::warn;

pub const SCHEMA_FALLBACK_NOTE: &str = "schema validation failed";

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaOutcome {
    pub value: Value,
    pub fallback_used: bool,
}

/// Parse `text` and validate it, falling back to a raw-text wrapper on any failure.
pub fn apply_schema(text: &str, schema: &OutputSchema) -> SchemaOutcome {
    let Some(value) = parse_json(text) else {
        warn!(schema = %schema.name, "Structured output did not parse as JSON; using fallback");
        return SchemaOutcome {
            value: fallback(text),
            fallback_used: true,
        };
    };

    match validate(&value, &schema.schema) {
        Ok(()) => SchemaOutcome {
            value,
            fallback_used: false,
        },
        Err(violations) => {
            warn!(
                schema = %schema.name,
                violations = violations.len(),
                first = %violations.first().map(String::as_str).unwrap_or_default(),
                "Structured output failed schema validation; using fallback"
            );
            SchemaOutcome {
                value: fallback(text),
                fallback_used: true,
            }
        }
    }
}

/// Fallback object returned when structured output is unusable.
pub fn fallback(text: &str) -> Value {
    json!({ "rawText": text, "note": SCHEMA_FALLBACK_NOTE })
}

/// Strip markdown code fences from a response
fn strip_markdown_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let clean = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```JSON"))
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    clean.strip_suffix("```").unwrap_or(clean).trim()
}

/// Extract the outermost `{...}` fragment
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if start <= end {
        Some(&text[start..=end])
    } else {
        None
    }
}

/// Parse model text as JSON, tolerating fences and surrounding prose.
pub fn parse_json(text: &str) -> Option<Value> {
    let clean = strip_markdown_fences(text);
    serde_json::from_str(clean).ok().or_else(|| {
        extract_json_object(clean).and_then(|fragment| serde_json::from_str(fragment).ok())
    })
}

/// Check `value` against `schema`, collecting every violation with its JSON path.
pub fn validate(value: &Value, schema: &Value) -> Result<(), Vec<String>> {
    let mut violations = Vec::new();
    check(value, schema, "$", &mut violations);
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn type_matches(value: &Value, expected: &str) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        // Unknown type names do not constrain.
        _ => true,
    }
}

fn check(value: &Value, schema: &Value, path: &str, violations: &mut Vec<String>) {
    let Some(schema) = schema.as_object() else {
        return;
    };

    if let Some(expected) = schema.get("type") {
        let ok = match expected {
            Value::String(name) => type_matches(value, name),
            Value::Array(names) => names
                .iter()
                .filter_map(Value::as_str)
                .any(|name| type_matches(value, name)),
            _ => true,
        };
        if !ok {
            violations.push(format!("{}: expected type {}", path, expected));
            return;
        }
    }

    if let Some(Value::Array(allowed)) = schema.get("enum") {
        if !allowed.contains(value) {
            violations.push(format!("{}: value not in enum", path));
        }
    }

    if let Some(Value::Array(options)) = schema.get("anyOf") {
        let any_ok = options
            .iter()
            .any(|option| validate(value, option).is_ok());
        if !any_ok {
            violations.push(format!("{}: matches none of anyOf", path));
        }
    }

    if let Value::Object(object) = value {
        check_object(object, schema, path, violations);
    }

    if let Value::Array(items) = value {
        if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
            if (items.len() as u64) < min {
                violations.push(format!("{}: expected at least {} items, got {}", path, min, items.len()));
            }
        }
        if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
            if (items.len() as u64) > max {
                violations.push(format!("{}: expected at most {} items, got {}", path, max, items.len()));
            }
        }
        if let Some(item_schema) = schema.get("items") {
            for (index, item) in items.iter().enumerate() {
                check(item, item_schema, &format!("{}[{}]", path, index), violations);
            }
        }
    }
}

fn check_object(
    object: &Map<String, Value>,
    schema: &Map<String, Value>,
    path: &str,
    violations: &mut Vec<String>,
) {
    if let Some(Value::Array(required)) = schema.get("required") {
        for name in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(name) {
                violations.push(format!("{}: missing required property '{}'", path, name));
            }
        }
    }

    let properties = schema.get("properties").and_then(Value::as_object);
    for (name, child) in object {
        let child_path = format!("{}.{}", path, name);
        match properties.and_then(|p| p.get(name)) {
            Some(child_schema) => check(child, child_schema, &child_path, violations),
            None => match schema.get("additionalProperties") {
                Some(Value::Bool(false)) => {
                    violations.push(format!("{}: unexpected property", child_path));
                }
                Some(extra @ Value::Object(_)) => check(child, extra, &child_path, violations),
                _ => {}
            },
        }
    }
}
