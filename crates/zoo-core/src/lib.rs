//! Zoo Core - admin domain layer
//!
//! Business rules of the zoo admin backend:
//! - Per-entity CRUD handlers dispatched through a registry
//! - Cascading soft deletes across configured relationships
//! - Sandbox assistants with a TTL and transactional promotion
//! - Assistant prompts merged from personality and guardrail records
//!
//! # Example
//!
//! ```rust,ignore
//! use zoo_core::{AdminService, EntityKind};
//! use zoo_store::Actor;
//!
//! # async fn example() -> Result<(), zoo_core::AdminError> {
//! let service = AdminService::in_memory();
//! let families = service.handlers().get(EntityKind::Family).unwrap();
//!
//! let mut body = zoo_store::Record::new();
//! body.insert("familyName".into(), "Okafor".into());
//! let family = families.create(body, &Actor::system()).await?;
//!
//! let report = service
//!     .cascade()
//!     .process_cascade_delete(EntityKind::Family, family["familyId"].as_str().unwrap(), true, None)
//!     .await?;
//! println!("soft-deleted {} rows", report.total_affected);
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod cascade;
pub mod error;
pub mod handlers;
pub mod kind;
mod references;
pub mod sandbox;
pub mod service;
pub mod stores;

pub use cascade::{CascadeConfig, CascadeEngine, CascadeReport, Relationship, CASCADE_REASON};
pub use error::{AdminError, AdminResult, FieldErrors};
pub use handlers::{
    AssistantHandler, EntityHandler, EntitySchema, HandlerRegistry, StandardHandler,
    MAX_KNOWLEDGE_BASE_FILES, USER_ROLES,
};
pub use kind::{EntityKind, TableConfigs};
pub use sandbox::{Promotion, SandboxManager, SandboxStatus, SANDBOX_TTL_MINUTES};
pub use service::AdminService;
pub use stores::Stores;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
