//! Per-entity CRUD handlers
//!
//! Every entity kind is served by an [`EntityHandler`]; the
//! [`HandlerRegistry`] maps kinds (and their collection path segments) to
//! handlers at startup. Deletes on every handler go through the
//! [`CascadeEngine`](crate::cascade::CascadeEngine).

mod assistant;
mod registry;
mod schema;
mod standard;

pub use assistant::{AssistantHandler, MAX_KNOWLEDGE_BASE_FILES};
pub use registry::HandlerRegistry;
pub use schema::{EntitySchema, USER_ROLES};
pub use standard::StandardHandler;

use crate::cascade::CascadeReport;
use crate::error::{AdminError, AdminResult};
use crate::kind::EntityKind;
use async_trait::async_trait;
use serde_json::Value;
use zoo_store::{Actor, Record, Table};

/// CRUD operations for one entity kind
#[async_trait]
pub trait EntityHandler: Send + Sync + std::fmt::Debug {
    /// Kind served
    fn kind(&self) -> EntityKind;

    /// Every record, soft-deleted ones only when asked
    async fn list(&self, include_deleted: bool) -> AdminResult<Vec<Record>>;

    /// One record by id, soft-deleted included
    async fn get(&self, id: &str) -> AdminResult<Record>;

    /// Validate and insert
    async fn create(&self, body: Record, by: &Actor) -> AdminResult<Record>;

    /// Validate and merge fields into an existing record
    async fn update(&self, id: &str, body: Record, by: &Actor) -> AdminResult<Record>;

    /// Soft-delete, cascading to dependents when enabled
    async fn delete(&self, id: &str, by: &Actor, cascade: bool) -> AdminResult<CascadeReport>;
}

/// Use the body's primary key when supplied, otherwise assign a UUID v4
pub(crate) fn assign_id(table: &Table, body: &mut Record) -> AdminResult<String> {
    let key = table.primary_key().to_string();
    match body.get(&key) {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(id.clone()),
        None | Some(Value::Null) => {
            let id = uuid::Uuid::new_v4().to_string();
            body.insert(key, Value::String(id.clone()));
            Ok(id)
        }
        Some(_) => Err(AdminError::invalid_field(key, "must be a non-empty string")),
    }
}

/// Fetch by id or fail with `NotFound`
pub(crate) async fn fetch(table: &Table, kind: EntityKind, id: &str) -> AdminResult<Record> {
    table
        .get(id)
        .await?
        .ok_or_else(|| AdminError::not_found(kind, id))
}
