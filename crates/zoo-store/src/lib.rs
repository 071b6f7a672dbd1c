//! Zoo Store - key-value table adapter
//!
//! Generic record storage for the zoo admin backend:
//! - One [`Table`] per entity type (table name + primary key configurable)
//! - Soft deletes and `created`/`modified` audit stamps on every write
//! - Conditional writes and all-or-nothing transactions via [`Backend`]
//! - Pluggable backends: [`MemoryBackend`] and, with the `dynamodb`
//!   feature, `DynamoBackend`
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use zoo_store::{Actor, MemoryBackend, SystemClock, Table, TableConfig};
//!
//! # async fn example() -> Result<(), zoo_store::StoreError> {
//! let table = Table::new(
//!     TableConfig::new("quest-dev-animal", "animalId"),
//!     Arc::new(MemoryBackend::new()),
//!     Arc::new(SystemClock),
//! );
//!
//! let mut record = zoo_store::Record::new();
//! record.insert("animalId".into(), "leo".into());
//! table.create(record, &Actor::system()).await?;
//! assert!(table.get("leo").await?.is_some());
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod memory;
pub mod record;
pub mod table;

#[cfg(feature = "dynamodb")]
pub mod dynamo;

pub use backend::{Backend, Condition, WriteOp};
pub use clock::{Clock, SystemClock};
pub use config::TableConfig;
pub use error::StoreError;
pub use memory::MemoryBackend;
pub use record::{format_timestamp, Actor, Record, RecordExt, Stamp};
pub use table::Table;

#[cfg(feature = "dynamodb")]
pub use dynamo::DynamoBackend;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
