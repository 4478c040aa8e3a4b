//! Property-based tests for the structured output step

use quill::formats::ContentFormat;
use quill::generation::schema::{apply_schema, fallback, validate};
use proptest::prelude::*;
use serde_json::json;

/// Any text yields either a value that validates or the raw-text fallback
#[test]
fn test_schema_step_is_total() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let schema = ContentFormat::Post.schema();

    runner
        .run(&any::<String>(), |text| {
            let outcome = apply_schema(&text, &schema);
            if outcome.fallback_used {
                prop_assert_eq!(outcome.value, fallback(&text));
            } else {
                prop_assert!(validate(&outcome.value, &schema.schema).is_ok());
            }
            Ok(())
        })
        .unwrap();
}

/// Well-formed posts pass, with or without fences and surrounding prose
#[test]
fn test_valid_posts_are_accepted() {
    let mut runner = proptest::test_runner::TestRunner::default();
    let schema = ContentFormat::Post.schema();

    runner
        .run(
            &(
                "[A-Za-z ]{1,30}",
                "[A-Za-z .,]{0,80}",
                prop::collection::vec("#[a-z]{1,12}", 0..5),
                0u8..3,
            ),
            |(title, caption, hashtags, wrapping)| {
                let body = json!({"title": title, "caption": caption, "hashtags": hashtags});
                let text = match wrapping {
                    0 => body.to_string(),
                    1 => format!("```json\n{}\n```", body),
                    _ => format!("Here is the post:\n{}\nEnjoy!", body),
                };

                let outcome = apply_schema(&text, &schema);
                prop_assert!(!outcome.fallback_used);
                prop_assert_eq!(outcome.value, body);
                Ok(())
            },
        )
        .unwrap();
}
