//! Shared data models for the Clipcast backend.
//!
//! This crate provides Serde-serializable types for:
//! - Videos and their pipeline status
//! - Transcripts with word/segment alignment
//! - Clips with virality scoring
//! - Scheduled posts and social accounts

pub mod account;
pub mod clip;
pub mod error;
pub mod schedule;
pub mod timestamp;
pub mod transcript;
pub mod video;

// Re-export common types
pub use account::{ConnectionStatus, Platform, SocialAccount};
pub use clip::{
    AspectRatio, CaptionStyle, Clip, ClipId, ClipStatus, ReviewDecision, ScoreWeights,
    ViralitySubScores,
};
pub use error::ModelError;
pub use schedule::{
    ApprovalStatus, PlatformDelivery, PostContent, PostId, PostStatus, ScheduledPost,
};
pub use timestamp::{format_seconds, parse_timestamp};
pub use transcript::{Segment, Transcript, Word};
pub use video::{FailureReason, Video, VideoId, VideoSource, VideoStatus};
