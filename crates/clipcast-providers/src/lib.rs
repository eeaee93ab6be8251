//! External collaborator contracts for the Clipcast pipeline.
//!
//! This crate provides:
//! - The provider error taxonomy and retry/backoff utilities
//! - The `MediaStore` seam with filesystem and in-memory implementations
//! - Adapter traits for download, transcription, virality analysis, and
//!   per-platform publishing

pub mod analyzer;
pub mod download;
pub mod error;
pub mod media_store;
pub mod publisher;
pub mod retry;
pub mod transcription;

pub use analyzer::{Candidate, ViralityAnalyzer};
pub use download::{DownloadAdapter, DownloadResult, HttpDownloadAdapter, DURATION_HEADER};
pub use error::{ProviderError, ProviderResult};
pub use media_store::{FsMediaStore, MediaStore, MemoryMediaStore};
pub use publisher::{PublishAdapter, PublishOutcome, PublisherRegistry};
pub use retry::{retry_provider, RetryConfig};
pub use transcription::{MediaNormalizer, TranscriptionAdapter, TranscriptionOutput};
