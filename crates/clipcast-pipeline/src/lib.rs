//! Video pipeline: ingestion, stage coordination, and virality ranking.
//!
//! This crate provides:
//! - The ingestion gateway (upload and remote-URL import entry points)
//! - The polling pipeline coordinator that drives videos through
//!   transcription and analysis to `ready`
//! - The ranking pass that turns analyzer candidates into reviewable clips

pub mod config;
pub mod coordinator;
pub mod error;
pub mod ingest;
pub mod ranking;

pub use config::PipelineConfig;
pub use coordinator::PipelineCoordinator;
pub use error::{PipelineError, PipelineResult};
pub use ingest::{IngestGateway, ALLOWED_MEDIA_TYPES};
pub use ranking::RankingPolicy;
