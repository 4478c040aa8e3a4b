//! Output extraction: normalize a raw response payload into plain text.
//!
//! Responses arrive in several shapes depending on API family and SDK vintage. Each
//! shape gets one small extractor; they are tried in order and the first non-blank
//! result wins. Extraction never fails; an unrecognized payload yields "".

use serde_json::Value;

/// Separator between text parts so adjacent parts never run together.
pub const PART_SEPARATOR: &str = "\n\n";

/// Part types that carry user-visible text.
const TEXT_PART_TYPES: &[&str] = &["output_text", "text"];

type Extractor = fn(&Value) -> Option<String>;

/// Shapes in priority order.
const EXTRACTORS: &[(&str, Extractor)] = &[
    ("top_level_text", top_level_text),
    ("output_items", output_items),
    ("message_content", message_content),
];

/// Normalize a raw response to plain text.
pub fn extract(response: &Value) -> String {
    EXTRACTORS
        .iter()
        .find_map(|(_, extractor)| extractor(response).filter(|text| !text.trim().is_empty()))
        .unwrap_or_default()
}

/// Name of the shape that produced text, if any. Used for diagnostics.
pub fn matched_shape(response: &Value) -> Option<&'static str> {
    EXTRACTORS.iter().find_map(|(name, extractor)| {
        extractor(response)
            .filter(|text| !text.trim().is_empty())
            .map(|_| *name)
    })
}

fn non_blank_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn join_parts(parts: Vec<String>) -> Option<String> {
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(PART_SEPARATOR))
    }
}

/// Text from a list of typed content parts; untyped or non-text parts are skipped.
fn typed_text_parts(parts: &[Value]) -> Vec<String> {
    parts
        .iter()
        .filter(|part| {
            part.get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| TEXT_PART_TYPES.contains(&t))
        })
        .filter_map(|part| non_blank_str(part.get("text")))
        .collect()
}

/// (a) A single top-level text field.
fn top_level_text(response: &Value) -> Option<String> {
    non_blank_str(response.get("output_text")).or_else(|| non_blank_str(response.get("text")))
}

/// (b) Output items, each with a list of content parts.
fn output_items(response: &Value) -> Option<String> {
    let items = response
        .get("output")
        .or_else(|| response.get("outputs"))
        .or_else(|| response.pointer("/data/output"))
        .and_then(Value::as_array)?;

    let parts: Vec<String> = items
        .iter()
        .filter_map(|item| {
            item.get("content")
                .or_else(|| item.get("contents"))
                .and_then(Value::as_array)
        })
        .flat_map(|content| typed_text_parts(content))
        .collect();
    join_parts(parts)
}

/// (c) Nested message content, as string or typed part list.
fn message_content(response: &Value) -> Option<String> {
    let content = response
        .pointer("/message/content")
        .or_else(|| response.pointer("/choices/0/message/content"))
        .or_else(|| response.get("content"))?;

    match content {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(parts) => join_parts(typed_text_parts(parts)),
        _ => None,
    }
}
