//! Repository traits for the entities the pipeline owns.
//!
//! Each status field has exactly one writing component: the coordinator owns
//! `Video.status`, reviewer actions own `Clip.status` review transitions, and
//! the orchestrator owns `ScheduledPost.status`. The repositories encode those
//! transitions as conditional operations so a concurrent actor observing a
//! stale row gets a `Conflict` instead of silently clobbering state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use clipcast_models::{
    ApprovalStatus, Clip, ClipId, FailureReason, Platform, PostId, PostStatus, ReviewDecision,
    ScheduledPost, SocialAccount, Transcript, Video, VideoId, VideoStatus,
};

use crate::error::StoreResult;

/// Outcome of replacing a video's analysis-generated clips.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Pending/rejected clips removed by the re-run.
    pub removed: usize,
    /// New candidate clips inserted.
    pub inserted: usize,
    /// Approved/scheduled clips left untouched.
    pub protected: usize,
}

/// Filter for listing scheduled posts.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub company_id: Option<String>,
    pub status: Option<PostStatus>,
    pub approval_status: Option<ApprovalStatus>,
}

#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn create_video(&self, video: Video) -> StoreResult<()>;

    async fn get_video(&self, id: &VideoId) -> StoreResult<Option<Video>>;

    /// Videos in non-terminal states, oldest stage first.
    async fn list_active_videos(&self) -> StoreResult<Vec<Video>>;

    /// Conditionally advance a video to the next stage. Fails with `Conflict`
    /// if the video is no longer in `expected` (deleted rows are `NotFound`).
    /// `media_ref`/`duration_secs` patch the row when the completing stage
    /// learned them.
    async fn advance_video_stage(
        &self,
        id: &VideoId,
        expected: VideoStatus,
        next: VideoStatus,
        media_ref: Option<String>,
        duration_secs: Option<f64>,
    ) -> StoreResult<Video>;

    /// Mark the pipeline failed. A no-op `Conflict` for terminal videos.
    async fn fail_video(
        &self,
        id: &VideoId,
        reason: FailureReason,
        message: &str,
    ) -> StoreResult<()>;

    /// Delete a video, cascading to its transcript, clips, and any scheduled
    /// posts referencing those clips.
    async fn delete_video(&self, id: &VideoId) -> StoreResult<()>;
}

#[async_trait]
pub trait TranscriptRepository: Send + Sync {
    /// Insert or replace the transcript for a video. Fails with `Conflict`
    /// if the video no longer exists (cancelled mid-flight).
    async fn upsert_transcript(&self, transcript: Transcript) -> StoreResult<()>;

    async fn get_transcript(&self, video_id: &VideoId) -> StoreResult<Option<Transcript>>;
}

#[async_trait]
pub trait ClipRepository: Send + Sync {
    async fn get_clip(&self, id: &ClipId) -> StoreResult<Option<Clip>>;

    /// Clips for a video, highest virality score first.
    async fn list_clips(&self, video_id: &VideoId) -> StoreResult<Vec<Clip>>;

    /// Replace a video's analysis-generated clips with a new candidate set.
    ///
    /// Re-analysis invariant: clips with a protected status (approved or
    /// scheduled) are never touched; only pending-review and rejected clips
    /// are removed. Fails with `Conflict` if the video no longer exists.
    async fn replace_analysis_clips(
        &self,
        video_id: &VideoId,
        clips: Vec<Clip>,
    ) -> StoreResult<ReplaceOutcome>;

    /// Apply a reviewer decision to a pending clip.
    async fn review_clip(&self, id: &ClipId, decision: ReviewDecision) -> StoreResult<Clip>;

    /// System transition `approved -> scheduled`, taken exactly when a
    /// scheduled post referencing the clip is created.
    async fn mark_clip_scheduled(&self, id: &ClipId) -> StoreResult<Clip>;

    /// Delete a clip; scheduled posts referencing it that have not yet
    /// published are invalidated (marked failed).
    async fn delete_clip(&self, id: &ClipId) -> StoreResult<()>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: ScheduledPost) -> StoreResult<()>;

    async fn get_post(&self, id: &PostId) -> StoreResult<Option<ScheduledPost>>;

    async fn list_posts(&self, filter: &PostFilter) -> StoreResult<Vec<ScheduledPost>>;

    /// Reviewer approval of a pending post.
    async fn approve_post(&self, id: &PostId) -> StoreResult<ScheduledPost>;

    /// Atomically claim up to `limit` due posts for dispatch: rows with
    /// `status = scheduled AND approval_status = approved AND scheduled_for
    /// <= now` move to `publishing` and are returned. Safe under concurrent
    /// sweep instances; a row is claimed by at most one caller.
    async fn claim_due_posts(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<ScheduledPost>>;

    /// Persist the outcome of a dispatch attempt for a claimed post. The
    /// stored row must still be `publishing`, otherwise `Conflict`; the
    /// passed post carries the final status (published, scheduled for a
    /// later retry, or failed) and updated platform results.
    async fn save_dispatch_outcome(&self, post: ScheduledPost) -> StoreResult<()>;
}

#[async_trait]
pub trait SocialAccountRepository: Send + Sync {
    async fn upsert_account(&self, account: SocialAccount) -> StoreResult<()>;

    /// The connected account for a company on a platform, if any.
    async fn find_connected_account(
        &self,
        company_id: &str,
        platform: Platform,
    ) -> StoreResult<Option<SocialAccount>>;
}

/// Convenience bound for components that need the whole store.
pub trait Store:
    VideoRepository
    + TranscriptRepository
    + ClipRepository
    + PostRepository
    + SocialAccountRepository
{
}

impl<T> Store for T where
    T: VideoRepository
        + TranscriptRepository
        + ClipRepository
        + PostRepository
        + SocialAccountRepository
{
}
