//! Prompt text extraction from stored records

use serde_json::{Map, Value};

/// Prompt text of a personality record (`systemPrompt`)
#[must_use]
pub fn personality_text(record: &Map<String, Value>) -> Option<String> {
    non_blank(record.get("systemPrompt"))
}

/// Prompt text of a guardrail record
///
/// Prefers `systemPrompt`; otherwise renders `rules` as a bullet list. A rule
/// is either a string or an object carrying `rule` or `description`.
#[must_use]
pub fn guardrail_text(record: &Map<String, Value>) -> Option<String> {
    if let Some(text) = non_blank(record.get("systemPrompt")) {
        return Some(text);
    }

    let rules = record.get("rules")?.as_array()?;
    let lines: Vec<String> = rules
        .iter()
        .filter_map(|rule| match rule {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(obj) => obj
                .get("rule")
                .or_else(|| obj.get("description"))
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .map(|s| format!("- {s}"))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}
