//! Segmented generation: bounded continuation when one call cannot hold the output.
//!
//! The model is told to end an unfinished answer with the continuation marker. While
//! the accumulated text is incomplete and the segment bound allows, a follow-up call
//! hands back what was already written and asks only for the remainder. Contributions
//! are stitched with any repeated overlap removed.

use crate::error::GenerationError;
use crate::generation::extract::{extract, PART_SEPARATOR};
use crate::generation::request::Completeness;
use crate::generation::selector::ModelCandidateSelector;
use tracing::{debug, info, warn};

/// Shortest repeated run treated as overlap when stitching.
pub const MIN_OVERLAP_CHARS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentOutcome {
    pub text: String,
    /// Model that produced the last segment
    pub model: String,
    pub segments: u32,
    pub continuation_used: bool,
    pub truncated: bool,
}

/// Instruction appended to the system text before every call.
pub fn marker_instruction(marker: &str) -> String {
    format!(
        "If you run out of space before the answer is finished, stop at a natural break and \
         end your reply with the exact token {marker} on its own. Never write {marker} when the \
         answer is complete."
    )
}

/// Final user turn of a continuation call.
pub fn continuation_turn(accumulated: &str, marker: &str) -> String {
    format!(
        "Your previous reply was cut off. The text already written is below between the \
         markers. Continue exactly where it stops and write only the remaining part. Do not \
         repeat or summarize anything already written and do not start over. If it still does \
         not fit, end with {marker} again.\n\n<<<WRITTEN>>>\n{accumulated}\n<<<END>>>"
    )
}

/// Remove a trailing marker (and the whitespace around it).
pub fn strip_marker(text: &str, marker: &str) -> String {
    let mut current = text.trim_end();
    while let Some(rest) = current.strip_suffix(marker) {
        current = rest.trim_end();
    }
    current.to_string()
}

/// Whether the accumulated text satisfies the completeness predicate.
pub fn is_complete(text: &str, completeness: &Completeness, marker: &str) -> bool {
    match completeness {
        Completeness::MarkerAbsent => !text.trim_end().ends_with(marker),
        Completeness::RequiredSections(labels) => {
            let haystack = text.to_lowercase();
            labels
                .iter()
                .all(|label| haystack.contains(&label.trim().to_lowercase()))
        }
    }
}

/// Drop the start of `addition` that repeats the end of `accumulated`.
///
/// Only runs of at least [`MIN_OVERLAP_CHARS`] characters count, so short coincidental
/// matches such as a shared word are kept.
pub fn trim_overlap<'a>(accumulated: &str, addition: &'a str) -> &'a str {
    let tail = accumulated.trim_end();
    let addition = addition.trim_start();

    let boundaries: Vec<usize> = addition
        .char_indices()
        .map(|(i, _)| i)
        .skip(1)
        .chain(std::iter::once(addition.len()))
        .filter(|&end| end <= tail.len())
        .collect();

    for &end in boundaries.iter().rev() {
        let prefix = &addition[..end];
        if prefix.chars().count() < MIN_OVERLAP_CHARS {
            break;
        }
        if tail.ends_with(prefix) {
            return addition[end..].trim_start();
        }
    }
    addition
}

/// Join a new contribution onto the accumulated text.
pub fn stitch(accumulated: &str, addition: &str, marker: &str) -> String {
    stitch_with(accumulated, addition, marker, PART_SEPARATOR)
}

/// Like [`stitch`], with an explicit separator. Structured output is joined with ""
/// so a value split mid-string stays parseable.
pub fn stitch_with(accumulated: &str, addition: &str, marker: &str, separator: &str) -> String {
    let addition = strip_marker(trim_overlap(accumulated, addition), marker);
    if addition.is_empty() {
        return accumulated.to_string();
    }
    if accumulated.is_empty() {
        return addition;
    }
    format!("{}{}{}", accumulated, separator, addition)
}

pub struct SegmentedGenerator<'a> {
    pub base_turns: &'a [String],
    pub max_segments: u32,
    pub completeness: &'a Completeness,
    pub marker: &'a str,
    /// Placed between segments; see [`stitch_with`]
    pub separator: &'a str,
}

impl SegmentedGenerator<'_> {
    pub async fn run(
        &self,
        selector: &mut ModelCandidateSelector,
    ) -> Result<SegmentOutcome, GenerationError> {
        // Start
        let first = selector.select(self.base_turns.to_vec()).await?;
        let first_text = extract(&first.response);
        if first_text.trim().is_empty() {
            return Err(GenerationError::EmptyOutput { model: first.model });
        }

        let mut raw = first_text;
        let mut model = first.model;
        let mut segments = 1u32;

        loop {
            // CheckComplete
            if is_complete(&raw, self.completeness, self.marker) {
                break;
            }
            if segments >= self.max_segments {
                warn!(
                    model = %model,
                    segments,
                    max_segments = self.max_segments,
                    "Output still incomplete at the segment bound; returning truncated text"
                );
                return Ok(self.done(raw, model, segments, true));
            }

            // Continue
            let accumulated = strip_marker(&raw, self.marker);
            let mut turns = self.base_turns.to_vec();
            turns.push(continuation_turn(&accumulated, self.marker));

            debug!(segment = segments + 1, accumulated_chars = accumulated.chars().count(), "Requesting continuation");
            let next = selector.select(turns).await?;
            segments += 1;
            model = next.model;

            let addition = extract(&next.response);
            if addition.trim().is_empty() {
                // `raw` still carries the marker the model ended with.
                let truncated = !is_complete(&raw, self.completeness, self.marker);
                info!(model = %model, segments, truncated, "Empty continuation; ending segmentation");
                return Ok(self.done(accumulated, model, segments, truncated));
            }

            // Keep a trailing marker on the raw text so the predicate still sees it.
            let ends_with_marker = addition.trim_end().ends_with(self.marker);
            raw = stitch_with(&accumulated, &addition, self.marker, self.separator);
            if ends_with_marker {
                raw.push('\n');
                raw.push_str(self.marker);
            }
        }

        Ok(self.done(raw, model, segments, false))
    }

    fn done(&self, raw: String, model: String, segments: u32, truncated: bool) -> SegmentOutcome {
        SegmentOutcome {
            text: strip_marker(&raw, self.marker),
            model,
            segments,
            continuation_used: segments > 1,
            truncated,
        }
    }
}
