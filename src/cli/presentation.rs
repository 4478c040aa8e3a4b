//! CLI presentation: render generation results for the terminal.

use crate::generation::package::{PackageOutcome, PackageReport};
use crate::generation::request::GenerationResult;
use serde::Serialize;
use serde_json::json;

fn to_pretty_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value)
        .unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string())
}

/// Structured value when one validated, otherwise the plain text.
pub fn format_result_text(result: &GenerationResult) -> String {
    match (&result.structured, result.schema_fallback_used) {
        (Some(structured), false) => to_pretty_json(structured),
        _ => result.text.clone(),
    }
}

pub fn format_result_json(result: &GenerationResult) -> String {
    to_pretty_json(result)
}

fn result_flags(result: &GenerationResult) -> String {
    let mut flags = vec![
        format!("model {}", result.model),
        format!("{} segment(s)", result.segments),
    ];
    if result.truncated {
        flags.push("truncated".to_string());
    }
    if result.schema_fallback_used {
        flags.push("schema fallback".to_string());
    }
    flags.join(", ")
}

pub fn format_package_text(report: &PackageReport) -> String {
    let mut sections: Vec<String> = report
        .outcomes
        .iter()
        .map(|outcome| match outcome {
            PackageOutcome::Generated { key, result } => format!(
                "## {} ({})\n\n{}",
                key,
                result_flags(result),
                format_result_text(result)
            ),
            PackageOutcome::Failed { key, error, .. } => format!("## {} (failed)\n\n{}", key, error),
        })
        .collect();
    sections.push(format!(
        "Generated {} of {} piece(s)",
        report.total_generated,
        report.total_generated + report.total_failed
    ));
    sections.join("\n\n")
}

pub fn format_package_json(report: &PackageReport) -> String {
    to_pretty_json(report)
}
