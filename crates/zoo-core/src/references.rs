//! Referenced-record lookups shared by the assistant handler and sandboxes

use crate::error::{AdminResult, FieldErrors};
use crate::kind::EntityKind;
use crate::stores::Stores;
use zoo_prompt::{
    guardrail_text, merge_assistant_prompt, personality_text, validate_assistant_prompt,
    validate_prompt_quality,
};
use zoo_store::{Record, RecordExt};

/// Load a live record of `kind`, noting a field error when it cannot be used
///
/// Missing, blank, or soft-deleted references add a reason under `field`.
pub(crate) async fn require_live(
    stores: &Stores,
    kind: EntityKind,
    id: Option<&str>,
    field: &str,
    errors: &mut FieldErrors,
) -> AdminResult<Option<Record>> {
    let Some(id) = id.filter(|s| !s.trim().is_empty()) else {
        errors.add(field, "is required");
        return Ok(None);
    };

    let table = stores.table(kind);
    match table.get(id).await? {
        Some(record) if !table.is_soft_deleted(&record) => Ok(Some(record)),
        Some(_) => {
            errors.add(field, format!("{kind} {id} has been deleted"));
            Ok(None)
        }
        None => {
            errors.add(field, format!("{kind} {id} does not exist"));
            Ok(None)
        }
    }
}

/// Records a merged assistant prompt is built from
#[derive(Debug, Clone)]
pub(crate) struct PromptSources {
    pub(crate) animal: Option<Record>,
    pub(crate) personality: Record,
    pub(crate) guardrail: Record,
}

impl PromptSources {
    /// Merge into the assistant system prompt
    pub(crate) fn merged_prompt(&self) -> AdminResult<String> {
        let personality = personality_text(&self.personality).unwrap_or_default();
        let guardrail = guardrail_text(&self.guardrail).unwrap_or_default();
        let (name, species) = self.animal.as_ref().map_or(("", ""), |a| {
            (
                a.str_field("name").unwrap_or_default(),
                a.str_field("species").unwrap_or_default(),
            )
        });

        let (merged, stats) = merge_assistant_prompt(name, species, &personality, &guardrail)?;
        tracing::debug!(
            total_chars = stats.total_chars,
            estimated_tokens = stats.estimated_tokens,
            quality = validate_prompt_quality(&merged),
            "merged assistant prompt"
        );

        // Advisory only; the merged prompt is stored either way
        let validation = validate_assistant_prompt(&merged, name);
        if !validation.passed {
            tracing::warn!(issues = ?validation.issues, "merged prompt failed validation");
        }
        Ok(merged)
    }
}
