//! Built-in content formats.
//!
//! Each format knows its instructions, the structural schema of its JSON variant and
//! the section labels a markdown answer must contain before it counts as finished.

use crate::generation::request::{Completeness, GenerationRequest, OutputSchema};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are an ethical, didactic content strategist. Write clear, accurate, practical material.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    Reels,
    Post,
    Carousel,
    Live,
    Stories,
}

impl ContentFormat {
    /// Generation order for a full package
    pub const ALL: [ContentFormat; 5] = [
        ContentFormat::Reels,
        ContentFormat::Post,
        ContentFormat::Carousel,
        ContentFormat::Live,
        ContentFormat::Stories,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ContentFormat::Reels => "reels",
            ContentFormat::Post => "post",
            ContentFormat::Carousel => "carousel",
            ContentFormat::Live => "live",
            ContentFormat::Stories => "stories",
        }
    }

    /// Section labels a markdown answer must contain.
    pub fn required_sections(&self) -> &'static [&'static str] {
        match self {
            ContentFormat::Reels => &["Reel 1", "Reel 2", "Reel 3"],
            ContentFormat::Post => &["Title", "Caption", "Hashtags"],
            ContentFormat::Carousel => &["Slide", "CTA", "Caption"],
            ContentFormat::Live => &["Opening", "Closing"],
            ContentFormat::Stories => &["Day 1", "Day 7"],
        }
    }

    /// Predicate for this format: JSON output relies on the marker, markdown on sections.
    pub fn completeness(&self, structured: bool) -> Completeness {
        if structured {
            Completeness::MarkerAbsent
        } else {
            Completeness::RequiredSections(
                self.required_sections()
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            )
        }
    }

    pub fn instructions(&self, structured: bool) -> String {
        let body = match self {
            ContentFormat::Reels => {
                "Write 3 short video scripts. For each: a 3-second hook, the main talking points, \
                 suggested b-roll, a closing call to action, a short caption and hashtags."
            }
            ContentFormat::Post => {
                "Write one feed post: a short title, the caption, an art direction suggestion \
                 and hashtags."
            }
            ContentFormat::Carousel => {
                "Write a carousel: a sequence of slides (title with a short subtitle, or a short \
                 list of points), a final call to action, the caption and hashtags."
            }
            ContentFormat::Live => {
                "Write a live session plan: an opening (hook, context, promise), 3 content blocks \
                 (title, bullets, practical example, a question for the chat), a Q&A section \
                 and a closing (recap and call to action)."
            }
            ContentFormat::Stories => {
                "Write 7 days of stories. For each day list the items: type, a short script, \
                 a suggested sticker and an optional call to action."
            }
        };

        if structured {
            format!("{} Answer with a single JSON object only.", body)
        } else {
            let sections = self
                .required_sections()
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "{} Answer in markdown and use these section headings: {}.",
                body, sections
            )
        }
    }

    pub fn schema(&self) -> OutputSchema {
        let schema = match self {
            ContentFormat::Reels => reels_schema(),
            ContentFormat::Post => post_schema(),
            ContentFormat::Carousel => carousel_schema(),
            ContentFormat::Live => live_schema(),
            ContentFormat::Stories => stories_schema(),
        };
        OutputSchema::new(self.key(), schema)
    }

    /// Request for this format built from a free-form brief.
    pub fn request(
        &self,
        candidates: Vec<String>,
        system: &str,
        brief: &str,
        structured: bool,
    ) -> GenerationRequest {
        let turn = format!(
            "{}\n\n---\nContext:\n{}",
            self.instructions(structured),
            brief.trim()
        );
        let request = GenerationRequest::new(candidates, system)
            .turn(turn)
            .with_completeness(self.completeness(structured));
        if structured {
            request.with_schema(self.schema())
        } else {
            request
        }
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ContentFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reels" | "reel" => Ok(ContentFormat::Reels),
            "post" => Ok(ContentFormat::Post),
            "carousel" | "carrossel" => Ok(ContentFormat::Carousel),
            "live" => Ok(ContentFormat::Live),
            "stories" | "story" => Ok(ContentFormat::Stories),
            other => Err(format!(
                "Unknown content format '{}'. Expected one of: reels, post, carousel, live, stories",
                other
            )),
        }
    }
}

fn string_list() -> Value {
    json!({"type": "array", "items": {"type": "string"}})
}

fn reels_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "reels": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "hook": {"type": "string"},
                        "talking_points": string_list(),
                        "closing_cta": {"type": "string"},
                        "b_roll": string_list(),
                        "short_caption": {"type": "string"},
                        "hashtags": string_list()
                    },
                    "required": ["hook", "talking_points", "closing_cta", "short_caption", "hashtags"],
                    "additionalProperties": false
                },
                "minItems": 3,
                "maxItems": 3
            }
        },
        "required": ["reels"],
        "additionalProperties": false
    })
}

fn post_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": {"type": "string"},
            "caption": {"type": "string"},
            "art_suggestion": {"type": "string"},
            "hashtags": string_list()
        },
        "required": ["title", "caption", "hashtags"],
        "additionalProperties": false
    })
}

fn carousel_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "slides": {
                "type": "array",
                "items": {
                    "anyOf": [
                        {
                            "type": "object",
                            "properties": {"title": {"type": "string"}, "subtitle": {"type": "string"}},
                            "required": ["title", "subtitle"],
                            "additionalProperties": false
                        },
                        {
                            "type": "object",
                            "properties": {"points": string_list()},
                            "required": ["points"],
                            "additionalProperties": false
                        }
                    ]
                }
            },
            "closing_cta": {"type": "string"},
            "caption": {"type": "string"},
            "hashtags": string_list(),
            "art_suggestion": {"type": "string"}
        },
        "required": ["slides", "closing_cta", "caption", "hashtags"],
        "additionalProperties": false
    })
}

fn live_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "opening": {
                "type": "object",
                "properties": {
                    "hook": {"type": "string"},
                    "context": {"type": "string"},
                    "promise": {"type": "string"}
                },
                "required": ["hook", "context", "promise"],
                "additionalProperties": false
            },
            "blocks": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "bullets": string_list(),
                        "practical_example": {"type": "string"},
                        "chat_question": {"type": "string"}
                    },
                    "required": ["title", "bullets", "practical_example", "chat_question"],
                    "additionalProperties": false
                },
                "minItems": 3,
                "maxItems": 3
            },
            "questions": {
                "type": "object",
                "properties": {"suggested_questions": string_list()},
                "required": ["suggested_questions"],
                "additionalProperties": false
            },
            "closing": {
                "type": "object",
                "properties": {"recap": {"type": "string"}, "cta": {"type": "string"}},
                "required": ["recap", "cta"],
                "additionalProperties": false
            }
        },
        "required": ["opening", "blocks", "questions", "closing"],
        "additionalProperties": false
    })
}

fn stories_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "stories": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "day": {"type": "string"},
                        "items": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "kind": {"type": "string"},
                                    "script": {"type": "string"},
                                    "sticker": {"type": "string"},
                                    "cta": {"type": "string"}
                                },
                                "required": ["kind", "script"],
                                "additionalProperties": false
                            }
                        }
                    },
                    "required": ["day", "items"],
                    "additionalProperties": false
                },
                "minItems": 7,
                "maxItems": 7
            }
        },
        "required": ["stories"],
        "additionalProperties": false
    })
}
