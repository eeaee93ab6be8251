//! Scheduling service: validates and creates scheduled posts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use clipcast_models::{
    ApprovalStatus, ClipId, ClipStatus, Platform, PostContent, PostId, ScheduledPost,
};
use clipcast_store::Store;

use crate::error::{PublishError, PublishResult};

/// Request to schedule a publication.
#[derive(Debug, Clone)]
pub struct CreatePostRequest {
    pub company_id: String,
    /// Clip to publish; ad-hoc posts carry their own media/content instead.
    pub clip_id: Option<ClipId>,
    pub platforms: Vec<Platform>,
    pub content: PostContent,
    /// Media for ad-hoc posts (clip-based posts inherit the video media).
    pub media_ref: Option<String>,
    /// Required unless `publish_now`.
    pub scheduled_for: Option<DateTime<Utc>>,
    pub publish_now: bool,
    /// Callers holding publish rights skip the approval gate.
    pub auto_approve: bool,
}

pub struct SchedulingService {
    store: Arc<dyn Store>,
}

impl SchedulingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Validate and create a scheduled post.
    ///
    /// All gates run before anything is written: the referenced clip must be
    /// approved and owned by the caller, and every target platform needs a
    /// connected account. A clip-based post also moves the clip
    /// `approved -> scheduled`.
    pub async fn create_scheduled_post(
        &self,
        mut req: CreatePostRequest,
    ) -> PublishResult<ScheduledPost> {
        if req.company_id.trim().is_empty() {
            return Err(PublishError::validation("company_id is required"));
        }
        if req.platforms.is_empty() {
            return Err(PublishError::validation(
                "at least one target platform is required",
            ));
        }
        // A platform listed twice would otherwise be delivered twice in one
        // sweep pass.
        let mut seen = std::collections::HashSet::new();
        req.platforms.retain(|p| seen.insert(*p));

        let now = Utc::now();
        let scheduled_for = if req.publish_now {
            now
        } else {
            let at = req
                .scheduled_for
                .ok_or_else(|| PublishError::validation("scheduled_for is required"))?;
            if at < now {
                return Err(PublishError::validation(format!(
                    "scheduled_for {} is in the past",
                    at
                )));
            }
            at
        };

        for platform in &req.platforms {
            let account = self
                .store
                .find_connected_account(&req.company_id, *platform)
                .await?;
            if account.is_none() {
                return Err(PublishError::validation(format!(
                    "no connected {} account",
                    platform
                )));
            }
        }

        let media_ref = match &req.clip_id {
            Some(clip_id) => {
                let clip = self
                    .store
                    .get_clip(clip_id)
                    .await?
                    .ok_or_else(|| PublishError::validation(format!("clip {} not found", clip_id)))?;
                if clip.company_id != req.company_id {
                    return Err(PublishError::validation(format!(
                        "clip {} not found",
                        clip_id
                    )));
                }
                if clip.status != ClipStatus::Approved {
                    return Err(PublishError::validation(format!(
                        "clip is {}, scheduling needs approved",
                        clip.status
                    )));
                }
                let video = self.store.get_video(&clip.video_id).await?;
                video.and_then(|v| v.media_ref)
            }
            None => {
                if req.media_ref.is_none() {
                    return Err(PublishError::validation(
                        "ad-hoc posts need a media_ref",
                    ));
                }
                req.media_ref.clone()
            }
        };

        // The conditional clip transition runs first so a concurrent
        // scheduling attempt for the same clip loses with a conflict before
        // any post exists.
        if let Some(clip_id) = &req.clip_id {
            self.store.mark_clip_scheduled(clip_id).await?;
        }

        let approval = if req.auto_approve {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Pending
        };
        let post = ScheduledPost::new(
            req.company_id,
            req.clip_id,
            req.platforms,
            req.content,
            media_ref,
            scheduled_for,
            approval,
        );
        self.store.create_post(post.clone()).await?;

        info!(
            post_id = %post.id,
            company_id = %post.company_id,
            platforms = post.platforms.len(),
            scheduled_for = %post.scheduled_for,
            "Scheduled post created"
        );
        Ok(post)
    }

    /// Reviewer approval of a pending post.
    pub async fn approve_post(&self, id: &PostId) -> PublishResult<ScheduledPost> {
        let post = self.store.approve_post(id).await?;
        info!(post_id = %id, "Post approved for publishing");
        Ok(post)
    }
}
