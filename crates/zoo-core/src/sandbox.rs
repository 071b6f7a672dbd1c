//! Sandbox assistants
//!
//! A sandbox is a short-lived draft of changes to a live assistant. It moves
//! `draft → tested`, then either gets promoted onto its base assistant or
//! expires; both terminal states remove the row. Expiry is an epoch-seconds
//! `ttl` compared against the injected clock.

use crate::error::{AdminError, AdminResult, FieldErrors};
use crate::kind::EntityKind;
use crate::references::{require_live, PromptSources};
use crate::stores::Stores;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zoo_store::record::MODIFIED_FIELD;
use zoo_store::{format_timestamp, Actor, Condition, Record, RecordExt, Stamp, Table};

/// Default sandbox lifetime
pub const SANDBOX_TTL_MINUTES: i64 = 30;

/// Fields a sandbox may override on its base assistant
pub const OVERRIDE_FIELDS: [&str; 4] = ["personalityId", "guardrailId", "name", "description"];

const MERGED_PROMPT_FIELD: &str = "mergedPrompt";

const REQUIRED_FIELDS: [&str; 4] = ["assistantId", "personalityId", "guardrailId", "name"];

/// Sandbox lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SandboxStatus {
    /// Created, not yet tried out
    Draft,
    /// Tried out and ready for promotion
    Tested,
}

impl SandboxStatus {
    /// Stored string form
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Tested => "tested",
        }
    }

    /// Parse stored string form
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(Self::Draft),
            "tested" => Some(Self::Tested),
            _ => None,
        }
    }
}

/// Result of promoting a sandbox
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    /// Updated live assistant
    pub assistant_id: String,
    /// Removed sandbox
    pub sandbox_id: String,
    /// Promotion time
    pub promoted_at: String,
}

/// Sandbox lifecycle operations
#[derive(Debug, Clone)]
pub struct SandboxManager {
    stores: Stores,
    ttl: Duration,
}

impl SandboxManager {
    /// Create manager with the default lifetime
    #[inline]
    #[must_use]
    pub fn new(stores: Stores) -> Self {
        Self {
            stores,
            ttl: Duration::minutes(SANDBOX_TTL_MINUTES),
        }
    }

    /// With a custom lifetime
    #[inline]
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn table(&self) -> &Table {
        self.stores.table(EntityKind::Sandbox)
    }

    fn is_expired(&self, record: &Record) -> bool {
        // Rows without a ttl are treated as already expired
        record
            .i64_field("ttl")
            .map_or(true, |ttl| ttl < self.stores.clock().epoch_seconds())
    }

    /// Create a draft sandbox from a live assistant
    ///
    /// # Errors
    /// - `AdminError::Validation` listing every missing required field
    /// - `AdminError::NotFound` when the base assistant is missing or deleted
    pub async fn create_sandbox_assistant(&self, request: Record, by: &Actor) -> AdminResult<Record> {
        let mut missing = FieldErrors::new();
        for field in REQUIRED_FIELDS {
            if request.str_field(field).map_or(true, |v| v.trim().is_empty()) {
                missing.add(field, "is required");
            }
        }
        if let Err(err) = missing.into_result("missing required sandbox fields") {
            tracing::warn!(error = %err, "sandbox create rejected");
            return Err(err);
        }

        let assistant_id = request.str_field("assistantId").unwrap_or_default().to_string();
        let assistants = self.stores.table(EntityKind::Assistant);
        let base = match assistants.get(&assistant_id).await? {
            Some(row) if !assistants.is_soft_deleted(&row) => row,
            _ => return Err(AdminError::not_found(EntityKind::Assistant, assistant_id)),
        };

        let mut sandbox = Record::new();
        sandbox.insert("assistantId".to_string(), Value::String(assistant_id.clone()));
        for field in OVERRIDE_FIELDS {
            if let Some(value) = request.get(field) {
                sandbox.insert(field.to_string(), value.clone());
            }
        }

        if let Some(merged) = self.preview_prompt(&base, &sandbox).await? {
            sandbox.insert(MERGED_PROMPT_FIELD.to_string(), Value::String(merged));
        }

        let sandbox_id = uuid::Uuid::new_v4().to_string();
        let expires = self.stores.clock().now() + self.ttl;
        sandbox.insert(self.table().primary_key().to_string(), Value::String(sandbox_id.clone()));
        sandbox.insert("status".to_string(), SandboxStatus::Draft.as_str().into());
        sandbox.insert("ttl".to_string(), expires.timestamp().into());
        sandbox.insert("createdBy".to_string(), serde_json::to_value(by).unwrap_or(Value::Null));

        let created = self.table().create(sandbox, by).await?;
        tracing::info!(sandbox_id = %sandbox_id, assistant_id = %assistant_id, by = %by.user_id, "sandbox created");
        Ok(created)
    }

    /// Fetch a live sandbox
    ///
    /// # Errors
    /// - `AdminError::NotFound` when missing
    /// - `AdminError::Gone` when its ttl has passed (the row is kept)
    pub async fn get_sandbox_assistant(&self, id: &str) -> AdminResult<Record> {
        let Some(record) = self.table().get(id).await? else {
            return Err(AdminError::not_found(EntityKind::Sandbox, id));
        };
        if self.is_expired(&record) {
            tracing::debug!(sandbox_id = id, "sandbox expired");
            return Err(AdminError::Gone {
                entity: EntityKind::Sandbox.as_str().to_string(),
                id: id.to_string(),
            });
        }
        Ok(record)
    }

    /// Non-expired sandboxes, optionally only those created by a user
    ///
    /// # Errors
    /// `AdminError::Store` on backend failure.
    pub async fn list_sandbox_assistants(&self, created_by: Option<&str>) -> AdminResult<Vec<Record>> {
        let rows = self.table().list(false).await?;
        Ok(rows
            .into_iter()
            .filter(|r| !self.is_expired(r))
            .filter(|r| {
                created_by.map_or(true, |user| {
                    r.get("createdBy")
                        .and_then(|c| c.get("userId"))
                        .and_then(Value::as_str)
                        == Some(user)
                })
            })
            .collect())
    }

    /// Change override fields or status; the ttl is not extended
    ///
    /// # Errors
    /// - `AdminError::NotFound` / `AdminError::Gone` as for get
    /// - `AdminError::Validation` for non-editable fields, unknown statuses,
    ///   or a status moving back to draft
    pub async fn update_sandbox_assistant(&self, id: &str, partial: Record, by: &Actor) -> AdminResult<Record> {
        let current = self.get_sandbox_assistant(id).await?;

        let mut errors = FieldErrors::new();
        let mut changes = Record::new();
        for (field, value) in partial {
            if OVERRIDE_FIELDS.contains(&field.as_str()) {
                changes.insert(field, value);
            } else if field == "status" {
                match value.as_str().and_then(SandboxStatus::parse) {
                    Some(SandboxStatus::Draft)
                        if current.str_field("status") == Some(SandboxStatus::Tested.as_str()) =>
                    {
                        errors.add("status", "cannot move from tested back to draft");
                    }
                    Some(status) => {
                        changes.insert(field, status.as_str().into());
                    }
                    None => errors.add("status", "must be one of: draft, tested"),
                }
            } else {
                errors.add(field, "is not editable on a sandbox");
            }
        }
        errors.into_result("invalid sandbox update")?;

        if changes.contains_key("personalityId") || changes.contains_key("guardrailId") {
            let assistant_id = current.str_field("assistantId").unwrap_or_default();
            let assistants = self.stores.table(EntityKind::Assistant);
            let base = match assistants.get(assistant_id).await? {
                Some(row) if !assistants.is_soft_deleted(&row) => row,
                _ => Record::new(),
            };
            let mut view = current.clone();
            view.extend(changes.clone());
            // A stale preview is cleared rather than kept
            let merged = self.preview_prompt(&base, &view).await?;
            changes.insert(
                MERGED_PROMPT_FIELD.to_string(),
                merged.map_or(Value::Null, Value::String),
            );
        }

        let updated = self
            .table()
            .update_fields(id, changes, by)
            .await?
            .ok_or_else(|| AdminError::not_found(EntityKind::Sandbox, id))?;
        tracing::info!(sandbox_id = id, by = %by.user_id, "sandbox updated");
        Ok(updated)
    }

    /// Remove a sandbox outright
    ///
    /// # Errors
    /// `AdminError::NotFound` when missing.
    pub async fn delete_sandbox_assistant(&self, id: &str) -> AdminResult<()> {
        if self.table().delete(id).await? {
            Ok(())
        } else {
            Err(AdminError::not_found(EntityKind::Sandbox, id))
        }
    }

    /// Apply a sandbox onto its base assistant and remove it
    ///
    /// The assistant write (must exist) and the sandbox delete (must exist)
    /// commit in one transaction.
    ///
    /// # Errors
    /// - `AdminError::NotFound` when the sandbox or base assistant is missing
    /// - `AdminError::Gone` when the sandbox has expired
    /// - `AdminError::Conflict` when a concurrent promotion won
    pub async fn promote_sandbox_to_live(&self, id: &str, by: &Actor) -> AdminResult<Promotion> {
        let sandbox = self.get_sandbox_assistant(id).await?;
        let assistant_id = sandbox.str_field("assistantId").unwrap_or_default().to_string();

        let assistants = self.stores.table(EntityKind::Assistant);
        let mut assistant = match assistants.get(&assistant_id).await? {
            Some(row) if !assistants.is_soft_deleted(&row) => row,
            _ => return Err(AdminError::not_found(EntityKind::Assistant, assistant_id)),
        };

        for field in OVERRIDE_FIELDS {
            if let Some(value) = sandbox.get(field) {
                assistant.insert(field.to_string(), value.clone());
            }
        }
        match self.preview_prompt(&assistant, &sandbox).await? {
            Some(merged) => {
                assistant.insert(MERGED_PROMPT_FIELD.to_string(), Value::String(merged));
            }
            None => {
                assistant.remove(MERGED_PROMPT_FIELD);
            }
        }

        let now = self.stores.clock().now();
        assistant.insert(MODIFIED_FIELD.to_string(), Stamp::new(by, now).to_value());

        let ops = vec![
            assistants.put_op(assistant, Condition::MustExist),
            self.table().delete_op(id, Condition::MustExist),
        ];
        assistants.transact(ops).await.map_err(|e| {
            if e.is_conflict() {
                tracing::warn!(sandbox_id = id, error = %e, "sandbox promotion lost a race");
                AdminError::Conflict(format!("sandbox {id} was promoted or removed concurrently"))
            } else {
                AdminError::Store(e)
            }
        })?;

        let promotion = Promotion {
            assistant_id,
            sandbox_id: id.to_string(),
            promoted_at: format_timestamp(now),
        };
        tracing::info!(
            target: "audit",
            action = "sandbox_promote",
            sandbox_id = id,
            assistant_id = %promotion.assistant_id,
            by = %by.user_id,
            "sandbox promoted"
        );
        Ok(promotion)
    }

    /// Hard-delete every sandbox whose ttl has passed
    ///
    /// # Errors
    /// `AdminError::Store` on backend failure; rows removed before the
    /// failure stay removed.
    pub async fn cleanup_expired_sandboxes(&self) -> AdminResult<usize> {
        let table = self.table();
        let mut removed = 0;
        for row in table.list(false).await? {
            if !self.is_expired(&row) {
                continue;
            }
            if let Some(id) = table.key_of(&row) {
                if table.delete(id).await? {
                    removed += 1;
                }
            }
        }
        tracing::info!(removed, "expired sandboxes cleaned up");
        Ok(removed)
    }

    /// Merged prompt for an assistant with sandbox overrides applied
    ///
    /// `None` when the personality or guardrail does not resolve to a live
    /// record or yields no prompt text.
    async fn preview_prompt(&self, base: &Record, overrides: &Record) -> AdminResult<Option<String>> {
        let pick = |field: &str| {
            overrides
                .str_field(field)
                .or_else(|| base.str_field(field))
                .map(ToString::to_string)
        };

        let mut errors = FieldErrors::new();
        let personality = require_live(
            &self.stores,
            EntityKind::Personality,
            pick("personalityId").as_deref(),
            "personalityId",
            &mut errors,
        )
        .await?;
        let guardrail = require_live(
            &self.stores,
            EntityKind::Guardrail,
            pick("guardrailId").as_deref(),
            "guardrailId",
            &mut errors,
        )
        .await?;

        let (Some(personality), Some(guardrail)) = (personality, guardrail) else {
            tracing::warn!(?errors, "sandbox references unresolved, prompt preview skipped");
            return Ok(None);
        };

        let animal = match base.str_field("animalId") {
            Some(animal_id) => self.stores.table(EntityKind::Animal).get(animal_id).await?,
            None => None,
        };

        let sources = PromptSources {
            animal,
            personality,
            guardrail,
        };
        match sources.merged_prompt() {
            Ok(merged) => Ok(Some(merged)),
            Err(err) => {
                tracing::warn!(error = %err, "prompt preview skipped");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_strings() {
        assert_eq!(SandboxStatus::parse("draft"), Some(SandboxStatus::Draft));
        assert_eq!(SandboxStatus::parse("tested"), Some(SandboxStatus::Tested));
        assert_eq!(SandboxStatus::parse("promoted"), None);
        assert_eq!(SandboxStatus::Tested.as_str(), "tested");
    }

    #[tokio::test]
    async fn missing_fields_reported_together() {
        let manager = SandboxManager::new(Stores::in_memory());
        let err = manager
            .create_sandbox_assistant(Record::new(), &Actor::system())
            .await
            .unwrap_err();

        let fields: Vec<_> = err.field_errors().unwrap().fields().collect();
        assert_eq!(fields, vec!["assistantId", "guardrailId", "name", "personalityId"]);
    }

    #[tokio::test]
    async fn unknown_sandbox_is_not_found() {
        let manager = SandboxManager::new(Stores::in_memory());
        assert_eq!(manager.get_sandbox_assistant("s1").await.unwrap_err().status(), 404);
        assert_eq!(manager.delete_sandbox_assistant("s1").await.unwrap_err().status(), 404);
        assert_eq!(
            manager
                .promote_sandbox_to_live("s1", &Actor::system())
                .await
                .unwrap_err()
                .status(),
            404
        );
    }
}
