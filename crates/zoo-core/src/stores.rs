//! One [`Table`] per entity kind over a shared backend

use crate::kind::{slot, EntityKind, TableConfigs};
use std::sync::Arc;
use zoo_store::{Backend, Clock, MemoryBackend, SystemClock, Table};

/// Table adapters for every entity kind
#[derive(Debug, Clone)]
pub struct Stores {
    tables: [Table; 8],
    clock: Arc<dyn Clock>,
}

impl Stores {
    /// Build adapters for every kind over one backend and clock
    #[must_use]
    pub fn new(configs: &TableConfigs, backend: Arc<dyn Backend>, clock: Arc<dyn Clock>) -> Self {
        let tables = EntityKind::ALL.map(|kind| {
            Table::new(configs.get(kind), Arc::clone(&backend), Arc::clone(&clock))
        });
        Self { tables, clock }
    }

    /// Default tables in memory with the system clock
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            &TableConfigs::defaults(),
            Arc::new(MemoryBackend::new()),
            Arc::new(SystemClock),
        )
    }

    /// Table of one kind
    #[inline]
    #[must_use]
    pub fn table(&self, kind: EntityKind) -> &Table {
        &self.tables[slot(kind)]
    }

    /// Shared clock
    #[inline]
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
