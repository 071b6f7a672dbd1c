//! Cascading soft deletes
//!
//! Soft-deleting a parent propagates to every configured child table:
//! - Relationships are explicit [`Relationship`] values in a [`CascadeConfig`]
//! - The walk is depth-first and keeps a visited set, so cyclic
//!   configurations terminate
//! - Nothing is rolled back; a failure partway leaves earlier soft deletes
//!   in place and a repeat call completes the walk

use crate::error::{AdminError, AdminResult};
use crate::kind::EntityKind;
use crate::stores::Stores;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use zoo_store::{format_timestamp, Actor};

/// Reason recorded on every cascaded write
pub const CASCADE_REASON: &str = "cascade_delete";

/// Parent → child link through a foreign-key attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    /// Parent kind
    pub parent: EntityKind,
    /// Child kind
    pub child: EntityKind,
    /// Child attribute holding the parent id
    pub foreign_key: String,
}

/// Cascade relationships
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeConfig {
    relationships: Vec<Relationship>,
}

impl CascadeConfig {
    /// Create config with no relationships
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self {
            relationships: Vec::new(),
        }
    }

    /// With an additional relationship
    #[inline]
    #[must_use]
    pub fn with_relationship(
        mut self,
        parent: EntityKind,
        child: EntityKind,
        foreign_key: impl Into<String>,
    ) -> Self {
        self.relationships.push(Relationship {
            parent,
            child,
            foreign_key: foreign_key.into(),
        });
        self
    }

    /// Relationships whose parent is `kind`, in declaration order
    pub fn children_of(&self, kind: EntityKind) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter().filter(move |r| r.parent == kind)
    }

    /// All relationships
    #[inline]
    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }
}

impl Default for CascadeConfig {
    /// family → user, user → conversation, animal → conversation
    fn default() -> Self {
        Self::empty()
            .with_relationship(EntityKind::Family, EntityKind::User, "familyId")
            .with_relationship(EntityKind::User, EntityKind::Conversation, "userId")
            .with_relationship(EntityKind::Animal, EntityKind::Conversation, "animalId")
    }
}

/// Outcome of a cascade delete or preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CascadeReport {
    /// Soft-deleted rows per entity type
    pub deleted_entities: BTreeMap<String, usize>,
    /// Sum of `deleted_entities`
    pub total_affected: usize,
    /// When the walk finished
    pub timestamp: String,
    /// True when nothing was written
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
}

/// Walks relationships and soft-deletes dependents
#[derive(Debug, Clone)]
pub struct CascadeEngine {
    stores: Stores,
    config: CascadeConfig,
}

impl CascadeEngine {
    /// Create engine over stores with explicit relationships
    #[inline]
    #[must_use]
    pub fn new(stores: Stores, config: CascadeConfig) -> Self {
        Self { stores, config }
    }

    /// Relationships in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &CascadeConfig {
        &self.config
    }

    /// Soft-delete an entity and, when enabled, everything beneath it
    ///
    /// Already soft-deleted rows, the primary included, are not counted but
    /// their dependents are still walked. A repeat call therefore completes
    /// an interrupted cascade and reports zero once everything is deleted.
    ///
    /// # Errors
    /// - `AdminError::NotFound` when the primary entity does not exist
    /// - `AdminError::Validation` for any failure after the primary lookup
    pub async fn process_cascade_delete(
        &self,
        kind: EntityKind,
        id: &str,
        cascade_enabled: bool,
        audit_user: Option<&str>,
    ) -> AdminResult<CascadeReport> {
        let actor = Actor::user(audit_user.unwrap_or(Actor::SYSTEM_USER_ID)).with_reason(CASCADE_REASON);
        let report = self.run(kind, id, cascade_enabled, Some(&actor)).await?;

        tracing::info!(
            target: "audit",
            action = CASCADE_REASON,
            entity = %kind,
            id,
            cascade = cascade_enabled,
            total_affected = report.total_affected,
            by = %actor.user_id,
            "cascade delete completed"
        );
        Ok(report)
    }

    /// Report what [`process_cascade_delete`](Self::process_cascade_delete)
    /// would do, without writing
    ///
    /// # Errors
    /// Same as `process_cascade_delete`.
    pub async fn preview_cascade_delete(&self, kind: EntityKind, id: &str) -> AdminResult<CascadeReport> {
        self.run(kind, id, true, None).await
    }

    async fn run(
        &self,
        kind: EntityKind,
        id: &str,
        cascade: bool,
        actor: Option<&Actor>,
    ) -> AdminResult<CascadeReport> {
        let table = self.stores.table(kind);
        let Some(primary) = table.get(id).await? else {
            tracing::warn!(entity = %kind, id, "cascade target not found");
            return Err(AdminError::not_found(kind, id));
        };
        let primary_live = !table.is_soft_deleted(&primary);

        let counts = self
            .walk(kind, id, primary_live, cascade, actor)
            .await
            .map_err(|e| {
                tracing::warn!(entity = %kind, id, error = %e, "cascade delete failed");
                AdminError::validation(format!("cascade delete failed: {e}"))
            })?;

        Ok(CascadeReport {
            total_affected: counts.values().sum(),
            deleted_entities: counts,
            timestamp: format_timestamp(self.stores.clock().now()),
            dry_run: actor.is_none(),
        })
    }

    async fn walk(
        &self,
        root_kind: EntityKind,
        root_id: &str,
        root_live: bool,
        cascade: bool,
        actor: Option<&Actor>,
    ) -> AdminResult<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        let mut visited = HashSet::from([(root_kind, root_id.to_string())]);

        if root_live {
            self.mark(root_kind, root_id, actor, &mut counts).await?;
        }
        if !cascade {
            return Ok(counts);
        }

        let mut stack = vec![(root_kind, root_id.to_string())];
        while let Some((parent_kind, parent_id)) = stack.pop() {
            let parent_value = Value::String(parent_id.clone());
            let mut discovered = Vec::new();

            for rel in self.config.children_of(parent_kind) {
                let child_table = self.stores.table(rel.child);
                let rows = child_table.query_gsi(&rel.foreign_key, &parent_value, None).await?;
                for row in rows {
                    let Some(child_id) = child_table.key_of(&row) else {
                        continue;
                    };
                    if visited.insert((rel.child, child_id.to_string())) {
                        let live = !child_table.is_soft_deleted(&row);
                        discovered.push((rel.child, child_id.to_string(), live));
                    }
                }
            }

            // Deleted children are not counted but still walked, which
            // finishes a cascade interrupted below the root
            for (child_kind, child_id, live) in &discovered {
                if *live {
                    self.mark(*child_kind, child_id, actor, &mut counts).await?;
                }
            }
            // Reverse so the first child's subtree is walked first
            stack.extend(discovered.into_iter().rev().map(|(kind, id, _)| (kind, id)));
        }

        Ok(counts)
    }

    async fn mark(
        &self,
        kind: EntityKind,
        id: &str,
        actor: Option<&Actor>,
        counts: &mut BTreeMap<String, usize>,
    ) -> AdminResult<()> {
        let counted = match actor {
            Some(actor) => self.stores.table(kind).soft_delete(id, actor).await?.is_some(),
            None => true,
        };
        if counted {
            *counts.entry(kind.as_str().to_string()).or_insert(0) += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use zoo_store::{Record, RecordExt};

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    async fn seed(stores: &Stores, kind: EntityKind, value: Value) {
        stores
            .table(kind)
            .create(record(value), &Actor::system())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_primary_is_not_found() {
        let engine = CascadeEngine::new(Stores::in_memory(), CascadeConfig::default());
        let err = engine
            .process_cascade_delete(EntityKind::Family, "nope", true, None)
            .await
            .unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[tokio::test]
    async fn disabled_cascade_touches_only_primary() {
        let stores = Stores::in_memory();
        seed(&stores, EntityKind::Animal, json!({"animalId": "leo"})).await;
        seed(
            &stores,
            EntityKind::Conversation,
            json!({"conversationId": "c1", "animalId": "leo"}),
        )
        .await;

        let engine = CascadeEngine::new(stores.clone(), CascadeConfig::default());
        let report = engine
            .process_cascade_delete(EntityKind::Animal, "leo", false, Some("keeper"))
            .await
            .unwrap();

        assert_eq!(report.total_affected, 1);
        assert_eq!(report.deleted_entities, BTreeMap::from([("animal".to_string(), 1)]));
        let conversation = stores.table(EntityKind::Conversation).get("c1").await.unwrap().unwrap();
        assert!(!conversation.flag("softDelete"));
    }

    #[tokio::test]
    async fn cascaded_rows_carry_reason() {
        let stores = Stores::in_memory();
        seed(&stores, EntityKind::User, json!({"userId": "u1"})).await;
        seed(
            &stores,
            EntityKind::Conversation,
            json!({"conversationId": "c1", "userId": "u1"}),
        )
        .await;

        let engine = CascadeEngine::new(stores.clone(), CascadeConfig::default());
        engine
            .process_cascade_delete(EntityKind::User, "u1", true, Some("admin-7"))
            .await
            .unwrap();

        let row = stores.table(EntityKind::Conversation).get("c1").await.unwrap().unwrap();
        let stamp = row.stamp("modified").unwrap();
        assert_eq!(stamp.by.user_id, "admin-7");
        assert_eq!(stamp.by.reason.as_deref(), Some(CASCADE_REASON));
    }

    #[tokio::test]
    async fn preview_writes_nothing() {
        let stores = Stores::in_memory();
        seed(&stores, EntityKind::User, json!({"userId": "u1"})).await;
        seed(
            &stores,
            EntityKind::Conversation,
            json!({"conversationId": "c1", "userId": "u1"}),
        )
        .await;

        let engine = CascadeEngine::new(stores.clone(), CascadeConfig::default());
        let preview = engine.preview_cascade_delete(EntityKind::User, "u1").await.unwrap();

        assert!(preview.dry_run);
        assert_eq!(preview.total_affected, 2);
        let user = stores.table(EntityKind::User).get("u1").await.unwrap().unwrap();
        assert!(!user.flag("softDelete"));
    }

    #[test]
    fn default_relationships() {
        let config = CascadeConfig::default();
        let children: Vec<_> = config.children_of(EntityKind::User).map(|r| r.child).collect();
        assert_eq!(children, vec![EntityKind::Conversation]);
        assert_eq!(config.relationships().len(), 3);
        assert_eq!(config.children_of(EntityKind::Sandbox).count(), 0);
    }

    #[test]
    fn report_serializes_camel_case() {
        let report = CascadeReport {
            deleted_entities: BTreeMap::from([("family".to_string(), 1)]),
            total_affected: 1,
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            dry_run: false,
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            json!({
                "deletedEntities": {"family": 1},
                "totalAffected": 1,
                "timestamp": "2026-01-01T00:00:00.000Z"
            })
        );
    }
}
