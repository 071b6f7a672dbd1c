//! Merge completeness properties
//!
//! Non-empty personality and guardrail text always survive merging
//! verbatim, surrounding whitespace included; empty input of either is
//! always rejected.

use proptest::prelude::*;
use zoo_prompt::{merge_assistant_prompt, validate_prompt_quality, PromptError};

/// Non-empty text, possibly padded or whitespace-only
fn section() -> impl Strategy<Value = String> {
    "[ \t\n]{0,3}[A-Za-z0-9 .,!?'\n-]{0,80}[ \t\n]{0,3}".prop_filter("non-empty", |s| !s.is_empty())
}

proptest! {
    #[test]
    fn merged_prompt_contains_both_sections(
        name in "[A-Z][a-z]{1,10}",
        species in "[a-z ]{0,20}",
        personality in section(),
        guardrail in section(),
    ) {
        let (merged, stats) = merge_assistant_prompt(&name, &species, &personality, &guardrail).unwrap();

        prop_assert!(merged.contains(&personality));
        prop_assert!(merged.contains(&guardrail));
        prop_assert!(merged.contains(&name));
        prop_assert!(merged.starts_with("You are "));
        prop_assert!(merged.ends_with(guardrail.as_str()));
        prop_assert_eq!(stats.total_chars, merged.chars().count());
    }

    #[test]
    fn empty_sections_rejected(text in section()) {
        prop_assert_eq!(
            merge_assistant_prompt("Leo", "lion", "", &text),
            Err(PromptError::MissingField { field: "personality_text" })
        );
        prop_assert_eq!(
            merge_assistant_prompt("Leo", "lion", &text, ""),
            Err(PromptError::MissingField { field: "guardrail_text" })
        );
    }

    #[test]
    fn quality_score_bounded(text in ".{0,400}") {
        let score = validate_prompt_quality(&text);
        prop_assert!((0.0..=1.0).contains(&score));
    }
}
