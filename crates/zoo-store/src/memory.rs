//! In-process backend
//!
//! Tables live behind one `RwLock` so a transaction can check every
//! condition and apply every write without another writer interleaving.
//! Rows keep insertion order, which is the order scans return them in.

use crate::backend::{Backend, Condition, WriteOp};
use crate::config::TableConfig;
use crate::error::StoreError;
use crate::record::Record;
use async_trait::async_trait;
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

type Rows = IndexMap<String, Record>;

/// Backend holding every table in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<HashMap<String, Rows>>,
}

impl MemoryBackend {
    /// Create empty backend
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in a table
    #[must_use]
    pub fn row_count(&self, table_name: &str) -> usize {
        self.tables.read().get(table_name).map_or(0, IndexMap::len)
    }

    /// Drop every row of every table
    pub fn clear(&self) {
        self.tables.write().clear();
    }

    fn apply_put(tables: &mut HashMap<String, Rows>, table: &TableConfig, key: String, item: Record) {
        let rows = tables.entry(table.table_name.clone()).or_default();
        // Replacing keeps the row's scan position.
        rows.insert(key, item);
    }

    fn apply_delete(tables: &mut HashMap<String, Rows>, table: &TableConfig, key: &str) -> bool {
        tables
            .get_mut(&table.table_name)
            .and_then(|rows| rows.shift_remove(key))
            .is_some()
    }

    fn exists(tables: &HashMap<String, Rows>, table: &TableConfig, key: &str) -> bool {
        tables
            .get(&table.table_name)
            .is_some_and(|rows| rows.contains_key(key))
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get_item(&self, table: &TableConfig, key: &str) -> Result<Option<Record>, StoreError> {
        Ok(self
            .tables
            .read()
            .get(&table.table_name)
            .and_then(|rows| rows.get(key))
            .cloned())
    }

    async fn put_item(
        &self,
        table: &TableConfig,
        item: Record,
        condition: Condition,
    ) -> Result<(), StoreError> {
        let key = crate::backend::primary_key_of(table, &item)?.to_string();
        let mut tables = self.tables.write();

        if !condition.holds(Self::exists(&tables, table, &key)) {
            return Err(StoreError::ConditionFailed {
                table: table.table_name.clone(),
                key,
            });
        }

        Self::apply_put(&mut tables, table, key, item);
        Ok(())
    }

    async fn delete_item(
        &self,
        table: &TableConfig,
        key: &str,
        condition: Condition,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables.write();

        if !condition.holds(Self::exists(&tables, table, key)) {
            return Err(StoreError::ConditionFailed {
                table: table.table_name.clone(),
                key: key.to_string(),
            });
        }

        Ok(Self::apply_delete(&mut tables, table, key))
    }

    async fn scan(&self, table: &TableConfig) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .tables
            .read()
            .get(&table.table_name)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn query_index(
        &self,
        table: &TableConfig,
        attribute: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, StoreError> {
        let tables = self.tables.read();
        let Some(rows) = tables.get(&table.table_name) else {
            return Ok(Vec::new());
        };

        Ok(rows
            .values()
            .filter(|row| row.get(attribute) == Some(value))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut tables = self.tables.write();

        // Validate everything before touching any row
        let mut seen = HashSet::new();
        for op in &ops {
            let key = op.key()?;
            let target = (op.table().table_name.clone(), key.to_string());
            if !seen.insert(target) {
                return Err(StoreError::TransactionCanceled(format!(
                    "multiple operations on {}/{}",
                    op.table().table_name,
                    key
                )));
            }
            if !op.condition().holds(Self::exists(&tables, op.table(), key)) {
                return Err(StoreError::TransactionCanceled(format!(
                    "condition failed on {}/{}",
                    op.table().table_name,
                    key
                )));
            }
        }

        for op in ops {
            match op {
                WriteOp::Put { table, item, .. } => {
                    let key = crate::backend::primary_key_of(&table, &item)?.to_string();
                    Self::apply_put(&mut tables, &table, key, item);
                }
                WriteOp::Delete { table, key, .. } => {
                    Self::apply_delete(&mut tables, &table, &key);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    fn item(value: serde_json::Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn put_get_delete() {
        let backend = MemoryBackend::new();
        let table = TableConfig::new("animals", "animalId");

        backend
            .put_item(&table, item(json!({"animalId": "a1", "name": "Leo"})), Condition::None)
            .await
            .unwrap();

        let got = backend.get_item(&table, "a1").await.unwrap().unwrap();
        assert_eq!(got["name"], "Leo");

        assert!(backend.delete_item(&table, "a1", Condition::None).await.unwrap());
        assert!(!backend.delete_item(&table, "a1", Condition::None).await.unwrap());
        assert!(backend.get_item(&table, "a1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn conditional_put() {
        let backend = MemoryBackend::new();
        let table = TableConfig::new("animals", "animalId");
        let row = item(json!({"animalId": "a1"}));

        backend.put_item(&table, row.clone(), Condition::MustNotExist).await.unwrap();
        let second = backend.put_item(&table, row.clone(), Condition::MustNotExist).await;
        assert!(matches!(second, Err(StoreError::ConditionFailed { .. })));

        let missing = backend
            .put_item(&table, item(json!({"animalId": "a2"})), Condition::MustExist)
            .await;
        assert!(matches!(missing, Err(StoreError::ConditionFailed { .. })));
    }

    #[tokio::test]
    async fn scan_keeps_insertion_order() {
        let backend = MemoryBackend::new();
        let table = TableConfig::new("users", "userId");

        for id in ["u3", "u1", "u2"] {
            backend
                .put_item(&table, item(json!({"userId": id})), Condition::None)
                .await
                .unwrap();
        }

        let ids: Vec<String> = backend
            .scan(&table)
            .await
            .unwrap()
            .iter()
            .map(|r| r["userId"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["u3", "u1", "u2"]);
    }

    #[tokio::test]
    async fn query_index_with_limit() {
        let backend = MemoryBackend::new();
        let table = TableConfig::new("users", "userId");

        for (id, family) in [("u1", "f1"), ("u2", "f1"), ("u3", "f2"), ("u4", "f1")] {
            backend
                .put_item(&table, item(json!({"userId": id, "familyId": family})), Condition::None)
                .await
                .unwrap();
        }

        let all = backend.query_index(&table, "familyId", &json!("f1"), None).await.unwrap();
        assert_eq!(all.len(), 3);

        let limited = backend.query_index(&table, "familyId", &json!("f1"), Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn transaction_is_all_or_nothing() {
        let backend = MemoryBackend::new();
        let assistants = Arc::new(TableConfig::new("assistants", "assistantId"));
        let sandboxes = Arc::new(TableConfig::new("sandboxes", "sandboxId"));

        backend
            .put_item(&assistants, item(json!({"assistantId": "as1", "v": 1})), Condition::None)
            .await
            .unwrap();

        // Sandbox row missing: the assistant put must not be applied
        let result = backend
            .transact_write(vec![
                WriteOp::Put {
                    table: assistants.clone(),
                    item: item(json!({"assistantId": "as1", "v": 2})),
                    condition: Condition::MustExist,
                },
                WriteOp::Delete {
                    table: sandboxes.clone(),
                    key: "sb1".to_string(),
                    condition: Condition::MustExist,
                },
            ])
            .await;

        assert!(matches!(result, Err(StoreError::TransactionCanceled(_))));
        let current = backend.get_item(&assistants, "as1").await.unwrap().unwrap();
        assert_eq!(current["v"], 1);
    }

    #[tokio::test]
    async fn transaction_applies_every_op() {
        let backend = MemoryBackend::new();
        let assistants = Arc::new(TableConfig::new("assistants", "assistantId"));
        let sandboxes = Arc::new(TableConfig::new("sandboxes", "sandboxId"));

        backend
            .put_item(&assistants, item(json!({"assistantId": "as1", "v": 1})), Condition::None)
            .await
            .unwrap();
        backend
            .put_item(&sandboxes, item(json!({"sandboxId": "sb1"})), Condition::None)
            .await
            .unwrap();

        backend
            .transact_write(vec![
                WriteOp::Put {
                    table: assistants.clone(),
                    item: item(json!({"assistantId": "as1", "v": 2})),
                    condition: Condition::MustExist,
                },
                WriteOp::Delete {
                    table: sandboxes.clone(),
                    key: "sb1".to_string(),
                    condition: Condition::MustExist,
                },
            ])
            .await
            .unwrap();

        assert_eq!(backend.get_item(&assistants, "as1").await.unwrap().unwrap()["v"], 2);
        assert_eq!(backend.row_count("sandboxes"), 0);
    }

    #[tokio::test]
    async fn transaction_rejects_duplicate_targets() {
        let backend = MemoryBackend::new();
        let table = Arc::new(TableConfig::new("t", "id"));

        let result = backend
            .transact_write(vec![
                WriteOp::Put {
                    table: table.clone(),
                    item: item(json!({"id": "x"})),
                    condition: Condition::None,
                },
                WriteOp::Delete {
                    table,
                    key: "x".to_string(),
                    condition: Condition::None,
                },
            ])
            .await;

        assert!(matches!(result, Err(StoreError::TransactionCanceled(_))));
    }
}
