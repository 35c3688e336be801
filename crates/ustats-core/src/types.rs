//! Validation errors shared by the core types.

use thiserror::Error;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// The string does not name a known event kind.
    #[error("unknown event kind: {value}")]
    UnknownKind { value: String },

    /// The string does not name a known bucket granularity.
    #[error("unknown bucket granularity: {value}")]
    UnknownGranularity { value: String },
}

/// Rejects empty identity strings.
pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(())
}
