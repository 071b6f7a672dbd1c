//! Error types for the store adapter

/// Store-level errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Create on a primary key that already exists
    #[error("item already exists in {table}: {key}")]
    Conflict { table: String, key: String },

    /// Conditional write rejected by the backend
    #[error("condition check failed in {table}: {key}")]
    ConditionFailed { table: String, key: String },

    /// Transaction aborted; no operation was applied
    #[error("transaction canceled: {0}")]
    TransactionCanceled(String),

    /// Update attempted to change the primary key
    #[error("primary key '{field}' is immutable")]
    ImmutableKey { field: String },

    /// Record lacks a string primary key
    #[error("record is missing primary key '{field}'")]
    MissingKey { field: String },

    /// Record could not be encoded or decoded
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Underlying storage service failed
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create backend error from any displayable cause
    #[inline]
    pub fn backend(message: impl std::fmt::Display) -> Self {
        Self::Backend(message.to_string())
    }

    /// Check if error is a key conflict or failed condition
    #[inline]
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::Conflict { .. } | Self::ConditionFailed { .. } | Self::TransactionCanceled(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_display() {
        let err = StoreError::Conflict {
            table: "users".to_string(),
            key: "u1".to_string(),
        };
        assert_eq!(err.to_string(), "item already exists in users: u1");
        assert!(err.is_conflict());
    }

    #[test]
    fn backend_is_not_conflict() {
        assert!(!StoreError::backend("timeout").is_conflict());
        assert!(StoreError::TransactionCanceled("x".into()).is_conflict());
    }
}
