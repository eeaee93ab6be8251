//! Publishing error types.

use thiserror::Error;

use clipcast_models::ModelError;
use clipcast_providers::ProviderError;
use clipcast_store::StoreError;

pub type PublishResult<T> = Result<T, PublishError>;

#[derive(Debug, Error)]
pub enum PublishError {
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

impl PublishError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
