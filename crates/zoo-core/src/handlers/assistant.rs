//! Assistant handler
//!
//! Assistants bind an animal to a personality and a guardrail:
//! - All three references must exist and be live
//! - At most one live assistant per animal
//! - `mergedPrompt` is derived, never taken from the request; it is
//!   recomputed whenever a reference changes

use super::{assign_id, fetch, EntityHandler, EntitySchema};
use crate::cascade::{CascadeEngine, CascadeReport};
use crate::error::{AdminError, AdminResult, FieldErrors};
use crate::kind::EntityKind;
use crate::references::{require_live, PromptSources};
use crate::stores::Stores;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use zoo_store::{Actor, Record, RecordExt, Table};

/// Most knowledge-base files one assistant may reference
pub const MAX_KNOWLEDGE_BASE_FILES: usize = 50;

const REFERENCE_FIELDS: [&str; 3] = ["animalId", "personalityId", "guardrailId"];

/// CRUD for assistants
#[derive(Debug, Clone)]
pub struct AssistantHandler {
    stores: Stores,
    cascade: Arc<CascadeEngine>,
}

impl AssistantHandler {
    /// Create handler
    #[inline]
    #[must_use]
    pub fn new(stores: Stores, cascade: Arc<CascadeEngine>) -> Self {
        Self { stores, cascade }
    }

    fn table(&self) -> &Table {
        self.stores.table(EntityKind::Assistant)
    }

    /// Resolve references of the merged view and derive the prompt
    ///
    /// Unusable references are noted in `errors` and yield `None`.
    async fn merged_prompt(&self, view: &Record, errors: &mut FieldErrors) -> AdminResult<Option<String>> {
        let stores = &self.stores;
        let animal = require_live(stores, EntityKind::Animal, view.str_field("animalId"), "animalId", errors).await?;
        let personality = require_live(
            stores,
            EntityKind::Personality,
            view.str_field("personalityId"),
            "personalityId",
            errors,
        )
        .await?;
        let guardrail =
            require_live(stores, EntityKind::Guardrail, view.str_field("guardrailId"), "guardrailId", errors).await?;

        match (animal, personality, guardrail) {
            (Some(animal), Some(personality), Some(guardrail)) => Ok(Some(
                PromptSources {
                    animal: Some(animal),
                    personality,
                    guardrail,
                }
                .merged_prompt()?,
            )),
            _ => Ok(None),
        }
    }

    /// Fail with `Conflict` when another live assistant serves the animal
    async fn check_one_per_animal(&self, animal_id: &str, own_id: Option<&str>) -> AdminResult<()> {
        let table = self.table();
        let taken = table
            .query_gsi("animalId", &Value::String(animal_id.to_string()), None)
            .await?
            .into_iter()
            .filter(|r| !table.is_soft_deleted(r))
            .any(|r| table.key_of(&r) != own_id);
        if taken {
            tracing::warn!(animal_id, "animal already has a live assistant");
            return Err(AdminError::Conflict(format!(
                "animal {animal_id} already has an active assistant"
            )));
        }
        Ok(())
    }
}

fn check_knowledge_base(body: &Record, errors: &mut FieldErrors) {
    match body.get("knowledgeBaseFileIds") {
        None | Some(Value::Null) => {}
        Some(Value::Array(ids)) => {
            if ids.len() > MAX_KNOWLEDGE_BASE_FILES {
                errors.add(
                    "knowledgeBaseFileIds",
                    format!("at most {MAX_KNOWLEDGE_BASE_FILES} files allowed, got {}", ids.len()),
                );
            }
            if ids.iter().any(|id| !id.is_string()) {
                errors.add("knowledgeBaseFileIds", "must contain only file id strings");
            }
        }
        Some(_) => errors.add("knowledgeBaseFileIds", "must be a list of file ids"),
    }
}

#[async_trait]
impl EntityHandler for AssistantHandler {
    fn kind(&self) -> EntityKind {
        EntityKind::Assistant
    }

    async fn list(&self, include_deleted: bool) -> AdminResult<Vec<Record>> {
        Ok(self.table().list(!include_deleted).await?)
    }

    async fn get(&self, id: &str) -> AdminResult<Record> {
        fetch(self.table(), EntityKind::Assistant, id).await
    }

    async fn create(&self, mut body: Record, by: &Actor) -> AdminResult<Record> {
        body.remove("mergedPrompt");

        let mut errors = EntitySchema::for_kind(EntityKind::Assistant).check_create(&body);
        check_knowledge_base(&body, &mut errors);
        errors.into_result("invalid assistant")?;

        let mut errors = FieldErrors::new();
        let prompt = self.merged_prompt(&body, &mut errors).await?;
        errors.into_result("assistant references cannot be resolved")?;

        let animal_id = body.str_field("animalId").unwrap_or_default().to_string();
        self.check_one_per_animal(&animal_id, None).await?;

        let id = assign_id(self.table(), &mut body)?;
        if let Some(prompt) = prompt {
            body.insert("mergedPrompt".to_string(), Value::String(prompt));
        }

        let created = self.table().create(body, by).await?;
        tracing::info!(assistant_id = %id, animal_id = %animal_id, by = %by.user_id, "assistant created");
        Ok(created)
    }

    async fn update(&self, id: &str, mut body: Record, by: &Actor) -> AdminResult<Record> {
        body.remove("mergedPrompt");

        let mut errors = EntitySchema::for_kind(EntityKind::Assistant).check_update(&body);
        check_knowledge_base(&body, &mut errors);
        errors.into_result("invalid assistant update")?;

        let current = fetch(self.table(), EntityKind::Assistant, id).await?;
        let touches_references = REFERENCE_FIELDS.iter().any(|f| body.contains_key(*f));

        if touches_references {
            let mut view = current.clone();
            view.extend(body.clone());

            let mut errors = FieldErrors::new();
            let prompt = self.merged_prompt(&view, &mut errors).await?;
            errors.into_result("assistant references cannot be resolved")?;

            if let Some(animal_id) = body.str_field("animalId") {
                if current.str_field("animalId") != Some(animal_id) {
                    self.check_one_per_animal(animal_id, Some(id)).await?;
                }
            }
            if let Some(prompt) = prompt {
                body.insert("mergedPrompt".to_string(), Value::String(prompt));
            }
        }

        let updated = self
            .table()
            .update_fields(id, body, by)
            .await?
            .ok_or_else(|| AdminError::not_found(EntityKind::Assistant, id))?;
        tracing::info!(assistant_id = id, by = %by.user_id, prompt_recomputed = touches_references, "assistant updated");
        Ok(updated)
    }

    async fn delete(&self, id: &str, by: &Actor, cascade: bool) -> AdminResult<CascadeReport> {
        self.cascade
            .process_cascade_delete(EntityKind::Assistant, id, cascade, Some(&by.user_id))
            .await
    }
}
