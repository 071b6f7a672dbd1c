//! Per-table adapter
//!
//! [`Table`] is the contract handlers see: get, list, create, update,
//! soft delete and secondary-index lookups over one configured table.
//! Every write stamps `modified` (and `created` on create) from the
//! injected clock.

use crate::backend::{primary_key_of, Backend, Condition, WriteOp};
use crate::clock::Clock;
use crate::config::TableConfig;
use crate::error::StoreError;
use crate::record::{Actor, Record, RecordExt, Stamp, CREATED_FIELD, MODIFIED_FIELD};
use serde_json::Value;
use std::sync::Arc;

/// Adapter over one table
#[derive(Debug, Clone)]
pub struct Table {
    config: Arc<TableConfig>,
    backend: Arc<dyn Backend>,
    clock: Arc<dyn Clock>,
}

impl Table {
    /// Create adapter for a table
    #[inline]
    #[must_use]
    pub fn new(config: TableConfig, backend: Arc<dyn Backend>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: Arc::new(config),
            backend,
            clock,
        }
    }

    /// Table configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Primary key attribute
    #[inline]
    #[must_use]
    pub fn primary_key(&self) -> &str {
        &self.config.primary_key
    }

    /// Soft-delete flag attribute
    #[inline]
    #[must_use]
    pub fn soft_delete_field(&self) -> &str {
        &self.config.soft_delete_field
    }

    /// Clock used for stamps
    #[inline]
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Whether a record carries the soft-delete flag
    #[inline]
    #[must_use]
    pub fn is_soft_deleted(&self, record: &Record) -> bool {
        record.flag(&self.config.soft_delete_field)
    }

    /// Primary key value of a record
    #[inline]
    #[must_use]
    pub fn key_of<'a>(&self, record: &'a Record) -> Option<&'a str> {
        primary_key_of(&self.config, record).ok()
    }

    /// Fetch by id, soft-deleted rows included
    pub async fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        tracing::debug!(table = %self.config.table_name, id, "get");
        self.backend.get_item(&self.config, id).await
    }

    /// Every row, optionally hiding soft-deleted ones
    pub async fn list(&self, hide_soft_deleted: bool) -> Result<Vec<Record>, StoreError> {
        let rows = self.backend.scan(&self.config).await?;
        Ok(rows
            .into_iter()
            .filter(|r| !(hide_soft_deleted && self.is_soft_deleted(r)))
            .collect())
    }

    /// Insert a new record
    ///
    /// Stamps `created` and `modified`, defaults the soft-delete flag to false.
    ///
    /// # Errors
    /// - `StoreError::MissingKey` if the primary key is absent
    /// - `StoreError::Conflict` if the key already exists
    pub async fn create(&self, mut record: Record, by: &Actor) -> Result<Record, StoreError> {
        let key = primary_key_of(&self.config, &record)?.to_string();

        let stamp = Stamp::new(by, self.clock.now()).to_value();
        record.insert(CREATED_FIELD.to_string(), stamp.clone());
        record.insert(MODIFIED_FIELD.to_string(), stamp);
        record
            .entry(self.config.soft_delete_field.clone())
            .or_insert(Value::Bool(false));

        match self
            .backend
            .put_item(&self.config, record.clone(), Condition::MustNotExist)
            .await
        {
            Ok(()) => {
                tracing::info!(table = %self.config.table_name, id = %key, "record created");
                Ok(record)
            }
            Err(StoreError::ConditionFailed { table, key }) => {
                tracing::warn!(table = %table, id = %key, "create rejected: key exists");
                Err(StoreError::Conflict { table, key })
            }
            Err(e) => Err(e),
        }
    }

    /// Merge fields into an existing record
    ///
    /// Returns `None` if the id does not exist. `created` in the partial is
    /// ignored; the primary key may be repeated but not changed.
    ///
    /// # Errors
    /// - `StoreError::ImmutableKey` if the partial changes the primary key
    pub async fn update_fields(
        &self,
        id: &str,
        partial: Record,
        by: &Actor,
    ) -> Result<Option<Record>, StoreError> {
        if let Some(new_key) = partial.get(&self.config.primary_key) {
            if new_key.as_str() != Some(id) {
                return Err(StoreError::ImmutableKey {
                    field: self.config.primary_key.clone(),
                });
            }
        }

        let Some(mut current) = self.get(id).await? else {
            return Ok(None);
        };

        for (field, value) in partial {
            if field == CREATED_FIELD {
                continue;
            }
            current.insert(field, value);
        }
        current.insert(
            MODIFIED_FIELD.to_string(),
            Stamp::new(by, self.clock.now()).to_value(),
        );

        self.write_existing(id, current).await
    }

    /// Set the soft-delete flag
    ///
    /// Returns the updated record, or `None` if the id does not exist.
    pub async fn soft_delete(&self, id: &str, by: &Actor) -> Result<Option<Record>, StoreError> {
        let Some(mut current) = self.get(id).await? else {
            return Ok(None);
        };

        current.insert(self.config.soft_delete_field.clone(), Value::Bool(true));
        current.insert(
            MODIFIED_FIELD.to_string(),
            Stamp::new(by, self.clock.now()).to_value(),
        );

        let updated = self.write_existing(id, current).await?;
        if updated.is_some() {
            tracing::info!(table = %self.config.table_name, id, by = %by.user_id, "record soft-deleted");
        }
        Ok(updated)
    }

    /// Remove a record outright, returning whether it existed
    pub async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let existed = self.backend.delete_item(&self.config, id, Condition::None).await?;
        if existed {
            tracing::info!(table = %self.config.table_name, id, "record deleted");
        }
        Ok(existed)
    }

    /// Records whose attribute equals value
    ///
    /// Uses the secondary index declared for the attribute when there is one.
    pub async fn query_gsi(
        &self,
        index_attr: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, StoreError> {
        self.backend
            .query_index(&self.config, index_attr, value, limit)
            .await
    }

    /// Whether any record matches on a secondary attribute
    pub async fn exists_on_gsi(
        &self,
        index_attr: &str,
        value: &Value,
        hide_soft_deleted: bool,
    ) -> Result<bool, StoreError> {
        let rows = self.query_gsi(index_attr, value, None).await?;
        Ok(rows
            .iter()
            .any(|r| !(hide_soft_deleted && self.is_soft_deleted(r))))
    }

    /// Transaction op writing a full record
    #[must_use]
    pub fn put_op(&self, item: Record, condition: Condition) -> WriteOp {
        WriteOp::Put {
            table: self.config.clone(),
            item,
            condition,
        }
    }

    /// Transaction op removing a record
    #[must_use]
    pub fn delete_op(&self, key: impl Into<String>, condition: Condition) -> WriteOp {
        WriteOp::Delete {
            table: self.config.clone(),
            key: key.into(),
            condition,
        }
    }

    /// Commit ops atomically through this table's backend
    pub async fn transact(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        self.backend.transact_write(ops).await
    }

    async fn write_existing(&self, id: &str, record: Record) -> Result<Option<Record>, StoreError> {
        match self
            .backend
            .put_item(&self.config, record.clone(), Condition::MustExist)
            .await
        {
            Ok(()) => Ok(Some(record)),
            // Removed between read and write
            Err(StoreError::ConditionFailed { .. }) => {
                tracing::debug!(table = %self.config.table_name, id, "record vanished during update");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::memory::MemoryBackend;
    use serde_json::json;

    fn table() -> Table {
        Table::new(
            TableConfig::new("quest-dev-animal", "animalId"),
            Arc::new(MemoryBackend::new()),
            Arc::new(SystemClock),
        )
    }

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn create_stamps_and_defaults() {
        let table = table();
        let created = table
            .create(record(json!({"animalId": "leo", "name": "Leo"})), &Actor::user("u1"))
            .await
            .unwrap();

        assert_eq!(created["softDelete"], false);
        assert_eq!(created["created"]["by"]["userId"], "u1");
        assert_eq!(created["created"], created["modified"]);
    }

    #[tokio::test]
    async fn create_duplicate_conflicts() {
        let table = table();
        let row = record(json!({"animalId": "leo"}));
        table.create(row.clone(), &Actor::system()).await.unwrap();

        let err = table.create(row, &Actor::system()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn create_without_key_fails() {
        let err = table()
            .create(record(json!({"name": "Leo"})), &Actor::system())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::MissingKey { .. }));
    }

    #[tokio::test]
    async fn update_merges_and_keeps_created() {
        let table = table();
        let created = table
            .create(record(json!({"animalId": "leo", "name": "Leo"})), &Actor::user("u1"))
            .await
            .unwrap();

        let updated = table
            .update_fields(
                "leo",
                record(json!({"species": "lion", "created": {"at": "forged"}})),
                &Actor::user("u2"),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated["name"], "Leo");
        assert_eq!(updated["species"], "lion");
        assert_eq!(updated["created"], created["created"]);
        assert_eq!(updated["modified"]["by"]["userId"], "u2");
    }

    #[tokio::test]
    async fn update_missing_is_none() {
        let result = table()
            .update_fields("ghost", record(json!({"name": "x"})), &Actor::system())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn update_cannot_change_key() {
        let table = table();
        table
            .create(record(json!({"animalId": "leo"})), &Actor::system())
            .await
            .unwrap();

        let err = table
            .update_fields("leo", record(json!({"animalId": "other"})), &Actor::system())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ImmutableKey { .. }));

        // Repeating the same key is fine
        let same = table
            .update_fields("leo", record(json!({"animalId": "leo", "age": 3})), &Actor::system())
            .await
            .unwrap();
        assert!(same.is_some());
    }

    #[tokio::test]
    async fn soft_delete_hides_from_list_only() {
        let table = table();
        for id in ["a", "b"] {
            table
                .create(record(json!({"animalId": id})), &Actor::system())
                .await
                .unwrap();
        }

        table.soft_delete("a", &Actor::user("u9")).await.unwrap().unwrap();

        let visible = table.list(true).await.unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0]["animalId"], "b");
        assert_eq!(table.list(false).await.unwrap().len(), 2);

        let fetched = table.get("a").await.unwrap().unwrap();
        assert!(table.is_soft_deleted(&fetched));
        assert_eq!(fetched["modified"]["by"]["userId"], "u9");
    }

    #[tokio::test]
    async fn soft_delete_missing_is_none() {
        assert!(table().soft_delete("ghost", &Actor::system()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn gsi_queries() {
        let table = table();
        table
            .create(record(json!({"animalId": "a", "species": "lion"})), &Actor::system())
            .await
            .unwrap();
        table
            .create(record(json!({"animalId": "b", "species": "lion"})), &Actor::system())
            .await
            .unwrap();
        table.soft_delete("a", &Actor::system()).await.unwrap();

        let lions = table.query_gsi("species", &json!("lion"), None).await.unwrap();
        assert_eq!(lions.len(), 2);

        table.soft_delete("b", &Actor::system()).await.unwrap();
        assert!(!table.exists_on_gsi("species", &json!("lion"), true).await.unwrap());
        assert!(table.exists_on_gsi("species", &json!("lion"), false).await.unwrap());
    }

    #[tokio::test]
    async fn hard_delete() {
        let table = table();
        table
            .create(record(json!({"animalId": "a"})), &Actor::system())
            .await
            .unwrap();

        assert!(table.delete("a").await.unwrap());
        assert!(!table.delete("a").await.unwrap());
        assert!(table.get("a").await.unwrap().is_none());
    }
}
