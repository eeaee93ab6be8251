//! Scheduled post models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::account::Platform;
use crate::clip::ClipId;
use crate::error::{ModelError, ModelResult};

/// Unique identifier for a scheduled post.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery status of a scheduled post.
///
/// `Publishing` is the transient claimed state: the dispatch sweep moves a due
/// post `Scheduled -> Publishing` with a conditional update, so a row is
/// claimed by at most one sweep instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    #[default]
    Scheduled,
    Publishing,
    Published,
    Failed,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Scheduled => "scheduled",
            PostStatus::Publishing => "publishing",
            PostStatus::Published => "published",
            PostStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reviewer approval gate, independent of delivery status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

/// Content for a post: overrides for clip-based posts, the whole payload for
/// ad-hoc posts.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct PostContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hashtags: Vec<String>,
}

/// Per-platform delivery outcome. One clip scheduled to several platforms has
/// independent outcomes; a delivered platform is never re-sent on retry.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct PlatformDelivery {
    pub delivered: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_post_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A unit of publication work targeting one or more platforms at a future (or
/// immediate) time.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScheduledPost {
    /// Unique post ID
    pub id: PostId,

    /// Owning company (tenant)
    pub company_id: String,

    /// Referenced clip (ad-hoc posts have none)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_id: Option<ClipId>,

    /// Target platforms
    pub platforms: Vec<Platform>,

    /// Content / content overrides
    #[serde(default)]
    pub content: PostContent,

    /// Media store reference for the asset to publish
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,

    /// When to publish
    pub scheduled_for: DateTime<Utc>,

    /// Delivery status
    #[serde(default)]
    pub status: PostStatus,

    /// Approval gate
    #[serde(default)]
    pub approval_status: ApprovalStatus,

    /// When the post finished publishing to all platforms
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,

    /// Last dispatch error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Completed dispatch attempts that left at least one platform undelivered
    #[serde(default)]
    pub retry_count: u32,

    /// Per-platform delivery outcomes
    #[serde(default)]
    pub platform_results: HashMap<Platform, PlatformDelivery>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl ScheduledPost {
    pub fn new(
        company_id: impl Into<String>,
        clip_id: Option<ClipId>,
        platforms: Vec<Platform>,
        content: PostContent,
        media_ref: Option<String>,
        scheduled_for: DateTime<Utc>,
        approval_status: ApprovalStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PostId::new(),
            company_id: company_id.into(),
            clip_id,
            platforms,
            content,
            media_ref,
            scheduled_for,
            status: PostStatus::Scheduled,
            approval_status,
            posted_at: None,
            error_message: None,
            retry_count: 0,
            platform_results: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the dispatch sweep may claim this post at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == PostStatus::Scheduled
            && self.approval_status == ApprovalStatus::Approved
            && self.scheduled_for <= now
    }

    /// Platforms that still need delivery.
    pub fn undelivered_platforms(&self) -> Vec<Platform> {
        self.platforms
            .iter()
            .copied()
            .filter(|p| {
                !self
                    .platform_results
                    .get(p)
                    .map(|r| r.delivered)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Record a successful delivery to one platform.
    pub fn record_delivered(&mut self, platform: Platform, external_post_id: Option<String>) {
        self.platform_results.insert(
            platform,
            PlatformDelivery {
                delivered: true,
                external_post_id,
                error: None,
            },
        );
        self.updated_at = Utc::now();
    }

    /// Record a failed delivery attempt to one platform.
    pub fn record_delivery_error(&mut self, platform: Platform, error: impl Into<String>) {
        self.platform_results.insert(
            platform,
            PlatformDelivery {
                delivered: false,
                external_post_id: None,
                error: Some(error.into()),
            },
        );
        self.updated_at = Utc::now();
    }

    /// All target platforms delivered.
    pub fn all_delivered(&self) -> bool {
        self.undelivered_platforms().is_empty()
    }

    /// Reviewer approval. Pending posts only.
    pub fn approve(&mut self) -> ModelResult<()> {
        if self.approval_status != ApprovalStatus::Pending {
            return Err(ModelError::invalid_transition(
                self.approval_status.as_str(),
                ApprovalStatus::Approved.as_str(),
            ));
        }
        self.approval_status = ApprovalStatus::Approved;
        self.updated_at = Utc::now();
        Ok(())
    }
}
