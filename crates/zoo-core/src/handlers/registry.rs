//! Handler registry
//!
//! Provides [`HandlerRegistry`] for dispatching requests to the handler of
//! an entity kind, looked up by kind or by collection path segment.

use super::{AssistantHandler, EntityHandler, StandardHandler};
use crate::cascade::CascadeEngine;
use crate::kind::EntityKind;
use crate::stores::Stores;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Entity kind → handler
#[derive(Debug, Default, Clone)]
pub struct HandlerRegistry {
    handlers: BTreeMap<EntityKind, Arc<dyn EntityHandler>>,
}

impl HandlerRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Create registry with the built-in handlers
    ///
    /// Every kind except sandboxes, which have their own lifecycle manager.
    #[must_use]
    pub fn with_defaults(stores: &Stores, cascade: &Arc<CascadeEngine>) -> Self {
        let mut registry = Self::new();
        for kind in [
            EntityKind::User,
            EntityKind::Family,
            EntityKind::Animal,
            EntityKind::Personality,
            EntityKind::Guardrail,
            EntityKind::Conversation,
        ] {
            registry.register(Arc::new(StandardHandler::new(
                kind,
                stores.clone(),
                Arc::clone(cascade),
            )));
        }
        registry.register(Arc::new(AssistantHandler::new(stores.clone(), Arc::clone(cascade))));
        registry
    }

    /// Register a handler, replacing any previous one for its kind
    pub fn register(&mut self, handler: Arc<dyn EntityHandler>) {
        tracing::debug!(entity = %handler.kind(), "handler registered");
        self.handlers.insert(handler.kind(), handler);
    }

    /// Handler for a kind
    #[inline]
    #[must_use]
    pub fn get(&self, kind: EntityKind) -> Option<Arc<dyn EntityHandler>> {
        self.handlers.get(&kind).cloned()
    }

    /// Handler for a path segment such as `users` or `user`
    #[must_use]
    pub fn resolve(&self, segment: &str) -> Option<Arc<dyn EntityHandler>> {
        segment.parse::<EntityKind>().ok().and_then(|k| self.get(k))
    }

    /// Registered kinds, sorted
    #[inline]
    #[must_use]
    pub fn kinds(&self) -> Vec<EntityKind> {
        self.handlers.keys().copied().collect()
    }

    /// Get number of registered handlers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::CascadeConfig;

    fn defaults() -> HandlerRegistry {
        let stores = Stores::in_memory();
        let cascade = Arc::new(CascadeEngine::new(stores.clone(), CascadeConfig::default()));
        HandlerRegistry::with_defaults(&stores, &cascade)
    }

    #[test]
    fn new_registry_empty() {
        let registry = HandlerRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.resolve("users").is_none());
    }

    #[test]
    fn defaults_cover_all_but_sandbox() {
        let registry = defaults();
        assert_eq!(registry.len(), 7);
        assert!(registry.get(EntityKind::Sandbox).is_none());
        assert!(!registry.kinds().contains(&EntityKind::Sandbox));
    }

    #[test]
    fn resolve_by_collection_segment() {
        let registry = defaults();
        assert_eq!(registry.resolve("users").map(|h| h.kind()), Some(EntityKind::User));
        assert_eq!(
            registry.resolve("assistants").map(|h| h.kind()),
            Some(EntityKind::Assistant)
        );
        assert!(registry.resolve("zebras").is_none());
    }
}
