//! Prompt validation and quality scoring

use serde::Serialize;
use std::collections::HashSet;

/// Longest prompt accepted for an assistant
pub const MAX_PROMPT_CHARS: usize = 16_000;

/// Word count at which the length score saturates
const TARGET_WORDS: usize = 150;

/// Outcome of [`validate_assistant_prompt`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptValidation {
    /// True when no issue was found
    pub passed: bool,
    /// Human-readable problems
    pub issues: Vec<String>,
}

/// Structural checks on a finished assistant prompt
///
/// Fails when the prompt is blank, does not mention the animal by name
/// (case-insensitive), exceeds [`MAX_PROMPT_CHARS`], or still carries
/// `{{` template placeholders.
#[must_use]
pub fn validate_assistant_prompt(text: &str, animal_name: &str) -> PromptValidation {
    let mut issues = Vec::new();
    let trimmed = text.trim();

    if trimmed.is_empty() {
        issues.push("prompt is empty".to_string());
    } else {
        let name = animal_name.trim();
        if !name.is_empty() && !trimmed.to_lowercase().contains(&name.to_lowercase()) {
            issues.push(format!("prompt does not mention the animal name '{name}'"));
        }
    }

    let chars = text.chars().count();
    if chars > MAX_PROMPT_CHARS {
        issues.push(format!(
            "prompt is {chars} characters, limit is {MAX_PROMPT_CHARS}"
        ));
    }

    if text.contains("{{") {
        issues.push("prompt contains unresolved template placeholders".to_string());
    }

    PromptValidation {
        passed: issues.is_empty(),
        issues,
    }
}

/// Quality score in `[0, 1]`
///
/// Mean of a length score (words / 150, capped at 1) and the ratio of
/// distinct words to words. Blank text scores 0.
#[must_use]
pub fn validate_prompt_quality(text: &str) -> f64 {
    let words: Vec<String> = text
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect();

    if words.is_empty() {
        return 0.0;
    }

    let distinct: HashSet<&str> = words.iter().map(String::as_str).collect();

    #[allow(clippy::cast_precision_loss)]
    let (length_score, uniqueness) = (
        (words.len() as f64 / TARGET_WORDS as f64).min(1.0),
        distinct.len() as f64 / words.len() as f64,
    );

    ((length_score + uniqueness) / 2.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_prompt_passes() {
        let result = validate_assistant_prompt("You are Leo, a lion.", "leo");
        assert!(result.passed);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn missing_name_fails() {
        let result = validate_assistant_prompt("You are a lion.", "Leo");
        assert!(!result.passed);
        assert_eq!(result.issues.len(), 1);
        assert!(result.issues[0].contains("Leo"));
    }

    #[test]
    fn empty_prompt_fails() {
        let result = validate_assistant_prompt("   ", "Leo");
        assert!(!result.passed);
        assert_eq!(result.issues, vec!["prompt is empty".to_string()]);
    }

    #[test]
    fn oversized_and_placeholder_fail() {
        let text = format!("Leo {{{{name}}}} {}", "x".repeat(MAX_PROMPT_CHARS));
        let result = validate_assistant_prompt(&text, "Leo");
        assert!(!result.passed);
        assert_eq!(result.issues.len(), 2);
    }

    #[test]
    fn quality_blank_is_zero() {
        assert_eq!(validate_prompt_quality(""), 0.0);
        assert_eq!(validate_prompt_quality(" ... "), 0.0);
    }

    #[test]
    fn quality_rewards_variety() {
        let repetitive = validate_prompt_quality("roar roar roar roar roar roar");
        let varied = validate_prompt_quality("lions sleep twenty hours daily in warm sun");
        assert!(varied > repetitive);
    }

    #[test]
    fn quality_long_unique_text_near_one() {
        let text: String = (0..200).map(|i| format!("word{i} ")).collect();
        let score = validate_prompt_quality(&text);
        assert!((score - 1.0).abs() < f64::EPSILON);
    }
}
