//! Table configuration
//!
//! Each entity table is described by a [`TableConfig`]. Deployments name
//! their tables through environment variables of the form
//! `<PREFIX>_DYNAMO_TABLE_NAME` and `<PREFIX>_DYNAMO_PK_NAME`, plus an
//! optional `<PREFIX>_DYNAMO_INDEXES` list of `attribute=index-name` pairs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default soft-delete flag attribute
pub const DEFAULT_SOFT_DELETE_FIELD: &str = "softDelete";

/// Configuration for one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Physical table name
    pub table_name: String,
    /// Primary key attribute
    pub primary_key: String,
    /// Soft-delete flag attribute
    pub soft_delete_field: String,
    /// Secondary indexes: attribute -> index name
    pub indexes: BTreeMap<String, String>,
}

impl TableConfig {
    /// Create config with the default soft-delete field and no indexes
    #[inline]
    #[must_use]
    pub fn new(table_name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            primary_key: primary_key.into(),
            soft_delete_field: DEFAULT_SOFT_DELETE_FIELD.to_string(),
            indexes: BTreeMap::new(),
        }
    }

    /// Resolve from `<PREFIX>_DYNAMO_*` environment variables
    #[must_use]
    pub fn from_env(prefix: &str, default_table: &str, default_key: &str) -> Self {
        Self::from_lookup(prefix, default_table, default_key, |name| {
            std::env::var(name).ok()
        })
    }

    /// Resolve using an arbitrary variable lookup
    #[must_use]
    pub fn from_lookup<F>(prefix: &str, default_table: &str, default_key: &str, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let table = lookup(&format!("{prefix}_DYNAMO_TABLE_NAME"))
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_table.to_string());
        let key = lookup(&format!("{prefix}_DYNAMO_PK_NAME"))
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default_key.to_string());

        let mut config = Self::new(table, key);
        if let Some(indexes) = lookup(&format!("{prefix}_DYNAMO_INDEXES")) {
            for pair in indexes.split(',') {
                if let Some((attr, index)) = pair.split_once('=') {
                    let (attr, index) = (attr.trim(), index.trim());
                    if !attr.is_empty() && !index.is_empty() {
                        config.indexes.insert(attr.to_string(), index.to_string());
                    }
                }
            }
        }
        config
    }

    /// With a secondary index on an attribute
    #[inline]
    #[must_use]
    pub fn with_index(mut self, attribute: impl Into<String>, index_name: impl Into<String>) -> Self {
        self.indexes.insert(attribute.into(), index_name.into());
        self
    }

    /// With a custom soft-delete field
    #[inline]
    #[must_use]
    pub fn with_soft_delete_field(mut self, field: impl Into<String>) -> Self {
        self.soft_delete_field = field.into();
        self
    }

    /// Index declared for an attribute
    #[inline]
    #[must_use]
    pub fn index_for(&self, attribute: &str) -> Option<&str> {
        self.indexes.get(attribute).map(String::as_str)
    }
}
