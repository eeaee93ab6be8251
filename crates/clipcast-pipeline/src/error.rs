//! Pipeline error types.

use thiserror::Error;

use clipcast_models::ModelError;
use clipcast_providers::ProviderError;
use clipcast_store::StoreError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Bad caller input. Never retried, returned immediately.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// The entity vanished or transitioned mid-flight; the in-flight stage
    /// work becomes a safe no-op.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            PipelineError::Store(StoreError::Conflict(_)) | PipelineError::Store(StoreError::NotFound(_))
        )
    }
}
