//! Error types for prompt assembly

/// Prompt assembly errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    /// Required prompt section is empty
    #[error("{field} is required and cannot be empty")]
    MissingField { field: &'static str },
}

impl PromptError {
    /// Name of the offending input
    #[inline]
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } => field,
        }
    }
}
