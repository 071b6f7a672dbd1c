//! Error types for the admin domain layer
//!
//! Every operation in this crate fails with an [`AdminError`], which maps
//! one-to-one onto an HTTP status and a JSON body:
//! - `NotFound` → 404
//! - `Conflict` → 409
//! - `Validation` → 400 (with per-field reasons)
//! - `Gone` → 410
//! - `Store` → 500, except key conflicts (409) and key misuse (400)

use crate::kind::EntityKind;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use zoo_prompt::PromptError;
use zoo_store::StoreError;

/// Field name → reasons it was rejected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a reason against a field
    pub fn add(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(reason.into());
    }

    /// Check if no field was rejected
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reasons recorded against a field
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Rejected field names, sorted
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok` when empty, otherwise a `Validation` error carrying these reasons
    ///
    /// # Errors
    /// `AdminError::Validation` when at least one field was rejected.
    pub fn into_result(self, message: impl Into<String>) -> Result<(), AdminError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AdminError::Validation {
                message: message.into(),
                field_errors: self,
            })
        }
    }

    fn to_value(&self) -> Value {
        json!(self.0)
    }
}

/// Domain errors
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Uniqueness or concurrency conflict
    #[error("conflict: {0}")]
    Conflict(String),

    /// Request rejected by validation
    #[error("{message}")]
    Validation {
        /// Summary message
        message: String,
        /// Per-field reasons, possibly empty
        field_errors: FieldErrors,
    },

    /// Entity existed but has expired
    #[error("{entity} has expired: {id}")]
    Gone { entity: String, id: String },

    /// Storage failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl AdminError {
    /// Create not-found error for an entity kind
    #[inline]
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: kind.as_str().to_string(),
            id: id.into(),
        }
    }

    /// Create validation error without field detail
    #[inline]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: FieldErrors::new(),
        }
    }

    /// Create validation error for a single field
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        let field = field.into();
        let reason = reason.into();
        let mut field_errors = FieldErrors::new();
        field_errors.add(field.clone(), reason.clone());
        Self::Validation {
            message: format!("{field}: {reason}"),
            field_errors,
        }
    }

    /// HTTP status code
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Conflict(_) => 409,
            Self::Validation { .. } => 400,
            Self::Gone { .. } => 410,
            Self::Store(e) if e.is_conflict() => 409,
            Self::Store(StoreError::ImmutableKey { .. } | StoreError::MissingKey { .. }) => 400,
            Self::Store(_) => 500,
        }
    }

    /// Stable machine-readable code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self.status() {
            404 => "NOT_FOUND",
            409 => "CONFLICT",
            400 => "VALIDATION_ERROR",
            410 => "GONE",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Per-field reasons, when any
    #[must_use]
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation { field_errors, .. } if !field_errors.is_empty() => Some(field_errors),
            _ => None,
        }
    }

    /// JSON error body: `{message, code, fieldErrors?}`
    #[must_use]
    pub fn body(&self) -> Value {
        let mut body = json!({
            "message": self.to_string(),
            "code": self.code(),
        });
        if let (Some(fields), Some(obj)) = (self.field_errors(), body.as_object_mut()) {
            obj.insert("fieldErrors".to_string(), fields.to_value());
        }
        body
    }

    /// Body and status pair
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (Value, u16) {
        (self.body(), self.status())
    }
}

impl From<PromptError> for AdminError {
    fn from(err: PromptError) -> Self {
        Self::invalid_field(err.field(), err.to_string())
    }
}

/// Result alias for domain operations
pub type AdminResult<T> = Result<T, AdminError>;
