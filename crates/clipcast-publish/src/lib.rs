//! Scheduling and publishing: post creation, the approval gate, and the
//! dispatch sweep that delivers due posts to their platforms.

pub mod config;
pub mod error;
pub mod scheduler;
pub mod sweeper;

pub use config::PublishConfig;
pub use error::{PublishError, PublishResult};
pub use scheduler::{CreatePostRequest, SchedulingService};
pub use sweeper::DispatchSweeper;
