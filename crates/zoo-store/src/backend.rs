//! Storage backend seam
//!
//! A [`Backend`] stores records for many tables. It knows nothing about
//! audit stamps or soft deletes; [`crate::Table`] layers those on top.

use crate::config::TableConfig;
use crate::error::StoreError;
use crate::record::Record;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Precondition on the target item of a write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Condition {
    /// Unconditional
    #[default]
    None,
    /// Item must already exist
    MustExist,
    /// Item must not exist yet
    MustNotExist,
}

impl Condition {
    /// Check condition against current item presence
    #[inline]
    #[must_use]
    pub fn holds(self, exists: bool) -> bool {
        match self {
            Self::None => true,
            Self::MustExist => exists,
            Self::MustNotExist => !exists,
        }
    }
}

/// One write inside a transaction
#[derive(Debug, Clone)]
pub enum WriteOp {
    /// Insert or replace an item
    Put {
        table: Arc<TableConfig>,
        item: Record,
        condition: Condition,
    },
    /// Remove an item
    Delete {
        table: Arc<TableConfig>,
        key: String,
        condition: Condition,
    },
}

impl WriteOp {
    /// Table targeted by this op
    #[inline]
    #[must_use]
    pub fn table(&self) -> &TableConfig {
        match self {
            Self::Put { table, .. } | Self::Delete { table, .. } => table.as_ref(),
        }
    }

    /// Primary key of the targeted item
    ///
    /// # Errors
    /// Returns `StoreError::MissingKey` when a put item lacks its key
    pub fn key(&self) -> Result<&str, StoreError> {
        match self {
            Self::Put { table, item, .. } => primary_key_of(table, item),
            Self::Delete { key, .. } => Ok(key.as_str()),
        }
    }

    /// Condition attached to this op
    #[inline]
    #[must_use]
    pub fn condition(&self) -> Condition {
        match self {
            Self::Put { condition, .. } | Self::Delete { condition, .. } => *condition,
        }
    }
}

/// Extract the string primary key of an item
///
/// # Errors
/// Returns `StoreError::MissingKey` when absent, empty or not a string
pub fn primary_key_of<'a>(table: &TableConfig, item: &'a Record) -> Result<&'a str, StoreError> {
    item.get(&table.primary_key)
        .and_then(Value::as_str)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| StoreError::MissingKey {
            field: table.primary_key.clone(),
        })
}

/// Multi-table key-value storage
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Fetch one item by primary key
    async fn get_item(&self, table: &TableConfig, key: &str) -> Result<Option<Record>, StoreError>;

    /// Write an item
    ///
    /// Fails with `StoreError::ConditionFailed` when `condition` does not hold.
    async fn put_item(
        &self,
        table: &TableConfig,
        item: Record,
        condition: Condition,
    ) -> Result<(), StoreError>;

    /// Remove an item, returning whether it existed
    async fn delete_item(
        &self,
        table: &TableConfig,
        key: &str,
        condition: Condition,
    ) -> Result<bool, StoreError>;

    /// Every item in the table, in backend order
    async fn scan(&self, table: &TableConfig) -> Result<Vec<Record>, StoreError>;

    /// Items whose attribute equals value
    async fn query_index(
        &self,
        table: &TableConfig,
        attribute: &str,
        value: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<Record>, StoreError>;

    /// Apply every op or none
    ///
    /// Fails with `StoreError::TransactionCanceled` when any condition does not hold.
    async fn transact_write(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn condition_holds() {
        assert!(Condition::None.holds(true));
        assert!(Condition::None.holds(false));
        assert!(Condition::MustExist.holds(true));
        assert!(!Condition::MustExist.holds(false));
        assert!(Condition::MustNotExist.holds(false));
        assert!(!Condition::MustNotExist.holds(true));
    }

    #[test]
    fn put_op_key() {
        let table = Arc::new(TableConfig::new("t", "id"));
        let item: Record = serde_json::from_value(json!({"id": "a1"})).unwrap();
        let op = WriteOp::Put {
            table: table.clone(),
            item,
            condition: Condition::MustExist,
        };
        assert_eq!(op.key().unwrap(), "a1");
        assert_eq!(op.condition(), Condition::MustExist);

        let missing = WriteOp::Put {
            table,
            item: Record::new(),
            condition: Condition::None,
        };
        assert!(matches!(missing.key(), Err(StoreError::MissingKey { .. })));
    }
}
