//! Admin service
//!
//! Wires the pieces built at startup:
//! - One [`Stores`] bundle over the chosen backend
//! - The [`CascadeEngine`] with explicit relationships
//! - The [`HandlerRegistry`] used for entity dispatch
//! - The [`SandboxManager`]

use crate::cascade::{CascadeConfig, CascadeEngine};
use crate::handlers::HandlerRegistry;
use crate::kind::TableConfigs;
use crate::sandbox::SandboxManager;
use crate::stores::Stores;
use std::sync::Arc;
use zoo_store::{Backend, Clock, MemoryBackend, SystemClock};

/// Everything a request needs
#[derive(Debug, Clone)]
pub struct AdminService {
    stores: Stores,
    cascade: Arc<CascadeEngine>,
    handlers: Arc<HandlerRegistry>,
    sandboxes: Arc<SandboxManager>,
}

impl AdminService {
    /// Create service over a backend
    #[must_use]
    pub fn new(
        tables: &TableConfigs,
        cascade: CascadeConfig,
        backend: Arc<dyn Backend>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::from_stores(Stores::new(tables, backend, clock), cascade)
    }

    /// Create service over prepared stores
    #[must_use]
    pub fn from_stores(stores: Stores, cascade: CascadeConfig) -> Self {
        let engine = Arc::new(CascadeEngine::new(stores.clone(), cascade));
        let handlers = HandlerRegistry::with_defaults(&stores, &engine);
        tracing::info!(handlers = handlers.len(), "admin service ready");
        Self {
            sandboxes: Arc::new(SandboxManager::new(stores.clone())),
            handlers: Arc::new(handlers),
            cascade: engine,
            stores,
        }
    }

    /// Default tables and relationships in memory
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(
            &TableConfigs::defaults(),
            CascadeConfig::default(),
            Arc::new(MemoryBackend::new()),
            Arc::new(SystemClock),
        )
    }

    /// Table adapters
    #[inline]
    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Cascade engine
    #[inline]
    #[must_use]
    pub fn cascade(&self) -> &CascadeEngine {
        &self.cascade
    }

    /// Handler registry
    #[inline]
    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Sandbox manager
    #[inline]
    #[must_use]
    pub fn sandboxes(&self) -> &SandboxManager {
        &self.sandboxes
    }
}
