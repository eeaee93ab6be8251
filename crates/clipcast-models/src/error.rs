//! Model-level validation errors.

use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    #[error("Invalid score weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid transcript: {0}")]
    InvalidTranscript(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl ModelError {
    pub fn invalid_transition(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::InvalidTransition {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn out_of_range(msg: impl Into<String>) -> Self {
        Self::OutOfRange(msg.into())
    }

    pub fn invalid_weights(msg: impl Into<String>) -> Self {
        Self::InvalidWeights(msg.into())
    }

    pub fn invalid_transcript(msg: impl Into<String>) -> Self {
        Self::InvalidTranscript(msg.into())
    }
}
