//! Transcription adapter contract.

use async_trait::async_trait;

use clipcast_models::{Segment, Word};

use crate::error::ProviderResult;

/// Raw provider output before it is persisted as a `Transcript`.
#[derive(Debug, Clone, Default)]
pub struct TranscriptionOutput {
    pub full_text: String,
    pub language: String,
    pub duration_secs: f64,
    pub words: Vec<Word>,
    pub segments: Vec<Segment>,
}

impl TranscriptionOutput {
    /// Silent or speech-free audio: a valid, empty result.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.segments.is_empty()
    }
}

/// Media -> aligned transcript. The provider is a black box; only the output
/// contract matters here.
///
/// Error contract: unsupported/corrupt codec is `Permanent` (the coordinator
/// attempts one normalization pass before giving up); rate-limit/quota blips
/// are `Transient` and retried with bounded backoff.
#[async_trait]
pub trait TranscriptionAdapter: Send + Sync {
    async fn transcribe(&self, media_ref: &str) -> ProviderResult<TranscriptionOutput>;
}

/// Media normalization hook used for the one-shot corrupt-codec retry:
/// re-encodes the object behind `media_ref` into a transcription-friendly
/// container and returns the new reference.
#[async_trait]
pub trait MediaNormalizer: Send + Sync {
    async fn normalize(&self, media_ref: &str) -> ProviderResult<String>;
}
