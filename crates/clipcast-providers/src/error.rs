//! Provider error taxonomy.
//!
//! Every collaborator call is classified into one of these buckets; the
//! pipeline retries transient errors with bounded backoff and surfaces the
//! rest immediately.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Bad input. Never retried, returned to the caller immediately.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Timeout / rate-limit / flaky network. Retried with bounded backoff.
    #[error("Transient provider error: {0}")]
    Transient(String),

    /// Auth/quota/unsupported-input failure. Surfaced immediately, no retry.
    #[error("Permanent provider error: {0}")]
    Permanent(String),

    /// Referenced object does not exist at the provider.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn permanent(msg: impl Into<String>) -> Self {
        Self::Permanent(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Only transient errors (and transient-looking IO) are worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Transient(_) | ProviderError::Io(_))
    }

    /// Classify a reqwest failure: timeouts and 5xx/429 are transient, 4xx
    /// and connection-level rejections are permanent.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Transient(format!("request timed out: {}", err));
        }
        if let Some(status) = err.status() {
            if status.is_server_error() || status.as_u16() == 429 {
                return Self::Transient(format!("upstream returned {}", status));
            }
            if status.as_u16() == 404 {
                return Self::NotFound(format!("upstream returned {}", status));
            }
            return Self::Permanent(format!("upstream returned {}", status));
        }
        if err.is_connect() {
            return Self::Transient(format!("connection failed: {}", err));
        }
        Self::Permanent(err.to_string())
    }
}
