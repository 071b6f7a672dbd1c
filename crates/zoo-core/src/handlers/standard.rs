//! Schema-driven handler for entities without special rules

use super::{assign_id, fetch, EntityHandler, EntitySchema};
use crate::cascade::{CascadeEngine, CascadeReport};
use crate::error::{AdminError, AdminResult};
use crate::kind::EntityKind;
use crate::stores::Stores;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use zoo_store::{Actor, Record, Table};

/// CRUD over one table, validated by an [`EntitySchema`]
#[derive(Debug, Clone)]
pub struct StandardHandler {
    schema: EntitySchema,
    stores: Stores,
    cascade: Arc<CascadeEngine>,
}

impl StandardHandler {
    /// Create handler with the built-in schema for `kind`
    #[inline]
    #[must_use]
    pub fn new(kind: EntityKind, stores: Stores, cascade: Arc<CascadeEngine>) -> Self {
        Self::with_schema(EntitySchema::for_kind(kind), stores, cascade)
    }

    /// Create handler with explicit rules
    #[inline]
    #[must_use]
    pub fn with_schema(schema: EntitySchema, stores: Stores, cascade: Arc<CascadeEngine>) -> Self {
        Self {
            schema,
            stores,
            cascade,
        }
    }

    /// Rules in use
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    fn table(&self) -> &Table {
        self.stores.table(self.schema.kind)
    }

    /// Reject values another live record already holds
    async fn check_unique(&self, body: &Record, own_id: Option<&str>) -> AdminResult<()> {
        let table = self.table();
        for attr in self.schema.unique {
            let Some(value) = body.get(*attr).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = table
                .query_gsi(attr, value, None)
                .await?
                .into_iter()
                .filter(|r| !table.is_soft_deleted(r))
                .any(|r| table.key_of(&r) != own_id);
            if clash {
                tracing::warn!(entity = %self.schema.kind, attr, "unique attribute already in use");
                return Err(AdminError::Conflict(format!(
                    "{} with {attr} {} already exists",
                    self.schema.kind,
                    display_value(value)
                )));
            }
        }
        Ok(())
    }
}

fn display_value(value: &Value) -> String {
    value.as_str().map_or_else(|| value.to_string(), ToString::to_string)
}

#[async_trait]
impl EntityHandler for StandardHandler {
    fn kind(&self) -> EntityKind {
        self.schema.kind
    }

    async fn list(&self, include_deleted: bool) -> AdminResult<Vec<Record>> {
        let rows = self.table().list(!include_deleted).await?;
        tracing::debug!(entity = %self.schema.kind, count = rows.len(), "listed");
        Ok(rows)
    }

    async fn get(&self, id: &str) -> AdminResult<Record> {
        fetch(self.table(), self.schema.kind, id).await
    }

    async fn create(&self, mut body: Record, by: &Actor) -> AdminResult<Record> {
        self.schema
            .check_create(&body)
            .into_result(format!("invalid {}", self.schema.kind))?;
        let id = assign_id(self.table(), &mut body)?;
        self.check_unique(&body, None).await?;

        let created = self.table().create(body, by).await?;
        tracing::info!(entity = %self.schema.kind, id = %id, by = %by.user_id, "entity created");
        Ok(created)
    }

    async fn update(&self, id: &str, body: Record, by: &Actor) -> AdminResult<Record> {
        self.schema
            .check_update(&body)
            .into_result(format!("invalid {} update", self.schema.kind))?;
        self.check_unique(&body, Some(id)).await?;

        let updated = self
            .table()
            .update_fields(id, body, by)
            .await?
            .ok_or_else(|| AdminError::not_found(self.schema.kind, id))?;
        tracing::info!(entity = %self.schema.kind, id, by = %by.user_id, "entity updated");
        Ok(updated)
    }

    async fn delete(&self, id: &str, by: &Actor, cascade: bool) -> AdminResult<CascadeReport> {
        self.cascade
            .process_cascade_delete(self.schema.kind, id, cascade, Some(&by.user_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::CascadeConfig;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn handler(kind: EntityKind) -> StandardHandler {
        let stores = Stores::in_memory();
        let cascade = Arc::new(CascadeEngine::new(stores.clone(), CascadeConfig::default()));
        StandardHandler::new(kind, stores, cascade)
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let users = handler(EntityKind::User);
        let actor = Actor::system();
        users
            .create(record(json!({"userId": "u1", "email": "keeper@zoo.org"})), &actor)
            .await
            .unwrap();

        let err = users
            .create(record(json!({"email": "keeper@zoo.org"})), &actor)
            .await
            .unwrap_err();
        assert_eq!(err.status(), 409);
    }

    #[tokio::test]
    async fn email_freed_by_soft_delete() {
        let users = handler(EntityKind::User);
        let actor = Actor::system();
        users
            .create(record(json!({"userId": "u1", "email": "keeper@zoo.org"})), &actor)
            .await
            .unwrap();
        users.delete("u1", &actor, true).await.unwrap();

        assert!(users
            .create(record(json!({"userId": "u2", "email": "keeper@zoo.org"})), &actor)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn update_keeps_own_email() {
        let users = handler(EntityKind::User);
        let actor = Actor::system();
        users
            .create(record(json!({"userId": "u1", "email": "keeper@zoo.org"})), &actor)
            .await
            .unwrap();

        let updated = users
            .update(
                "u1",
                record(json!({"email": "keeper@zoo.org", "role": "admin"})),
                &actor,
            )
            .await
            .unwrap();
        assert_eq!(updated.get("role"), Some(&json!("admin")));
    }

    #[tokio::test]
    async fn update_unknown_is_not_found() {
        let animals = handler(EntityKind::Animal);
        let err = animals
            .update("ghost", record(json!({"name": "Ghost"})), &Actor::system())
            .await
            .unwrap_err();
        assert_eq!(err.status(), 404);
    }

    #[tokio::test]
    async fn list_hides_soft_deleted_by_default() {
        let animals = handler(EntityKind::Animal);
        let actor = Actor::system();
        for (id, name) in [("leo", "Leo"), ("zara", "Zara")] {
            animals
                .create(
                    record(json!({"animalId": id, "name": name, "species": "lion"})),
                    &actor,
                )
                .await
                .unwrap();
        }
        animals.delete("zara", &actor, false).await.unwrap();

        assert_eq!(animals.list(false).await.unwrap().len(), 1);
        assert_eq!(animals.list(true).await.unwrap().len(), 2);
        assert!(animals.get("zara").await.is_ok());
    }
}
