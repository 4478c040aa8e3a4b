//! Property-based tests for continuation stitching

use quill::generation::segments::{stitch, trim_overlap, MIN_OVERLAP_CHARS};
use proptest::prelude::*;

const MARKER: &str = "<CONTINUE>";

/// A repeated run at the join is kept exactly once
#[test]
fn test_stitch_never_duplicates_overlap() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                "[a-z ]{0,40}",
                "[a-z]{16,40}",
                "[A-Z][A-Za-z]{0,40}",
            ),
            |(prefix, shared, rest)| {
                let accumulated = format!("{}{}", prefix, shared);
                let addition = format!("{}{}", shared, rest);

                let stitched = stitch(&accumulated, &addition, MARKER);
                prop_assert_eq!(stitched, format!("{}\n\n{}", accumulated, rest));
                Ok(())
            },
        )
        .unwrap();
}

/// Additions that share less than the minimum run are kept whole
#[test]
fn test_short_overlap_is_kept() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &("[a-z]{1,30}", "[a-z]{1,15}", "[A-Z][A-Za-z]{0,20}"),
            |(prefix, shared, rest)| {
                prop_assume!(shared.chars().count() < MIN_OVERLAP_CHARS);
                let accumulated = format!("{} {}", prefix, shared);
                let addition = format!("{}{}", shared, rest);

                prop_assert_eq!(trim_overlap(&accumulated, &addition), addition.as_str());
                Ok(())
            },
        )
        .unwrap();
}

/// Arbitrary text, including multi-byte characters, never panics and never loses
/// the accumulated text
#[test]
fn test_stitch_arbitrary_text() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(any::<String>(), any::<String>()), |(accumulated, addition)| {
            let trimmed = trim_overlap(&accumulated, &addition);
            prop_assert!(addition.trim_start().ends_with(trimmed));

            let stitched = stitch(&accumulated, &addition, MARKER);
            prop_assert!(stitched.starts_with(accumulated.as_str()));
            Ok(())
        })
        .unwrap();
}
