// error.rs — Error types for the goal tracking core.

use thiserror::Error;

/// Errors that can occur during goal operations.
#[derive(Debug, Error)]
pub enum GoalError {
    /// The caller supplied input that fails the creation guard.
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    /// No goal with the given ID exists in the collection.
    #[error("goal not found: {0}")]
    NotFound(String),

    /// A file I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    IoError {
        path: String,
        source: std::io::Error,
    },

    /// Failed to serialize/deserialize goal data.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// The backend refused a value larger than its storage quota.
    #[error("storage quota exceeded for key '{key}': {size} bytes > {limit} bytes")]
    QuotaExceeded {
        key: String,
        size: usize,
        limit: usize,
    },

    /// Any other backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A notification dispatch failed (non-fatal).
    #[error("notification error: {0}")]
    NotificationError(String),
}

impl GoalError {
    pub(crate) fn validation(field: &str, reason: &str) -> Self {
        GoalError::Validation {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for failures of the persistence backend (read, write, encode).
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            GoalError::IoError { .. }
                | GoalError::SerializationError(_)
                | GoalError::QuotaExceeded { .. }
                | GoalError::Backend(_)
        )
    }
}
