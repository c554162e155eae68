//! Store errors

use thiserror::Error;

/// Errors raised by a [`crate::DcimStore`] implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A uniqueness or foreign-key constraint rejected the write
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),

    /// Invalid request (e.g., updating a record without an id)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transaction misuse or a commit conflict
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Backend failure unrelated to the data itself
    #[error("Storage backend error: {0}")]
    Backend(String),
}
