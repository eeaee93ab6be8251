//! Entity repositories for the Clipcast pipeline.
//!
//! This crate provides:
//! - Repository traits with conditional status-transition operations
//! - The in-memory implementation used by tests and single-node deployments

pub mod error;
pub mod memory;
pub mod repo;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use repo::{
    ClipRepository, PostFilter, PostRepository, ReplaceOutcome, SocialAccountRepository, Store,
    TranscriptRepository, VideoRepository,
};
