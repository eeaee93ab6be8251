//! Store error types.

use thiserror::Error;

use clipcast_models::ModelError;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    /// The entity was claimed, transitioned, or deleted by another actor
    /// mid-flight. Callers treat this as a safe no-op.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl StoreError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Whether this error means "someone else got there first" rather than
    /// "the operation was wrong".
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}
