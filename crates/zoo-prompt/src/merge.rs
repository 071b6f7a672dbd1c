//! Personality + guardrail merging

use crate::error::PromptError;
use serde::Serialize;

/// Section separator in merged prompts
const SECTION_SEPARATOR: &str = "\n\n";

/// Statistics about a merged prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeStats {
    /// Characters in the identity preamble
    pub preamble_chars: usize,
    /// Characters in the personality section
    pub personality_chars: usize,
    /// Characters in the guardrail section
    pub guardrail_chars: usize,
    /// Characters in the merged prompt
    pub total_chars: usize,
    /// Number of sections joined
    pub section_count: usize,
    /// Rough token estimate (4 chars per token)
    pub estimated_tokens: usize,
}

/// Merge personality and guardrail text into one system prompt
///
/// Sections, in order: identity preamble built from the animal's name and
/// species, the personality text, the guardrail text, joined by blank
/// lines. Personality and guardrail text are inserted exactly as given;
/// only the generated preamble is trimmed, so the merged prompt never
/// gains leading or trailing whitespace of its own.
///
/// # Errors
/// `PromptError::MissingField` naming `personality_text` or `guardrail_text`
/// when either is empty.
pub fn merge_assistant_prompt(
    animal_name: &str,
    animal_species: &str,
    personality_text: &str,
    guardrail_text: &str,
) -> Result<(String, MergeStats), PromptError> {
    if personality_text.is_empty() {
        return Err(PromptError::MissingField {
            field: "personality_text",
        });
    }
    if guardrail_text.is_empty() {
        return Err(PromptError::MissingField {
            field: "guardrail_text",
        });
    }

    let preamble = identity_preamble(animal_name, animal_species);
    let sections = [preamble.as_str(), personality_text, guardrail_text];
    let present: Vec<&str> = sections.into_iter().filter(|s| !s.is_empty()).collect();
    let merged = present.join(SECTION_SEPARATOR);

    let total_chars = merged.chars().count();
    let stats = MergeStats {
        preamble_chars: preamble.chars().count(),
        personality_chars: personality_text.chars().count(),
        guardrail_chars: guardrail_text.chars().count(),
        total_chars,
        section_count: present.len(),
        estimated_tokens: total_chars.div_ceil(4),
    };

    Ok((merged, stats))
}

fn identity_preamble(name: &str, species: &str) -> String {
    let name = name.trim();
    let species = species.trim();
    match (name.is_empty(), species.is_empty()) {
        (true, true) => String::new(),
        (true, false) => format!("You are {} {species} who lives at the zoo.", article(species)),
        (false, true) => format!("You are {name}."),
        (false, false) => format!(
            "You are {name}, {} {species} who lives at the zoo.",
            article(species)
        ),
    }
}

/// Indefinite article for a noun, by its first letter
fn article(noun: &str) -> &'static str {
    match noun.chars().next().map(|c| c.to_ascii_lowercase()) {
        Some('a' | 'e' | 'i' | 'o' | 'u') => "an",
        _ => "a",
    }
}
