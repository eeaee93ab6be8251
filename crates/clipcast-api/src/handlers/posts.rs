//! Scheduled post handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clipcast_models::{
    ApprovalStatus, ClipId, Platform, PostContent, PostId, PostStatus, ScheduledPost,
};
use clipcast_publish::CreatePostRequest;
use clipcast_store::{PostFilter, StoreError};

use crate::company::CompanyId;
use crate::error::ApiResult;
use crate::metrics::record_post_created;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreatePostBody {
    pub clip_id: Option<String>,
    pub platforms: Vec<Platform>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub hashtags: Vec<String>,
    /// Media for ad-hoc posts without a clip.
    #[serde(default)]
    pub media_ref: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
    #[serde(default)]
    pub publish_now: bool,
    #[serde(default)]
    pub auto_approve: bool,
}

#[derive(Serialize)]
pub struct PostResponse {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_id: Option<String>,
    pub platforms: Vec<Platform>,
    pub status: String,
    pub approval_status: String,
    pub scheduled_for: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub retry_count: u32,
    pub platform_results: std::collections::HashMap<Platform, clipcast_models::PlatformDelivery>,
}

impl From<ScheduledPost> for PostResponse {
    fn from(post: ScheduledPost) -> Self {
        Self {
            id: post.id.to_string(),
            clip_id: post.clip_id.map(|c| c.to_string()),
            platforms: post.platforms,
            status: post.status.to_string(),
            approval_status: post.approval_status.as_str().to_string(),
            scheduled_for: post.scheduled_for.to_rfc3339(),
            posted_at: post.posted_at.map(|t| t.to_rfc3339()),
            error_message: post.error_message,
            retry_count: post.retry_count,
            platform_results: post.platform_results,
        }
    }
}

/// Create a scheduled post for an approved clip (or ad-hoc content).
pub async fn create_post(
    State(state): State<AppState>,
    company: CompanyId,
    Json(body): Json<CreatePostBody>,
) -> ApiResult<(StatusCode, Json<PostResponse>)> {
    let post = state
        .scheduler
        .create_scheduled_post(CreatePostRequest {
            company_id: company.0.clone(),
            clip_id: body.clip_id.map(ClipId::from_string),
            platforms: body.platforms,
            content: PostContent {
                title: body.title,
                body: body.body,
                hashtags: body.hashtags,
            },
            media_ref: body.media_ref,
            scheduled_for: body.scheduled_for,
            publish_now: body.publish_now,
            auto_approve: body.auto_approve,
        })
        .await?;

    record_post_created();
    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

#[derive(Deserialize, Default)]
pub struct PostQuery {
    pub status: Option<PostStatus>,
    pub approval_status: Option<ApprovalStatus>,
}

/// List the company's scheduled posts, optionally filtered by status.
pub async fn list_posts(
    State(state): State<AppState>,
    company: CompanyId,
    Query(query): Query<PostQuery>,
) -> ApiResult<Json<Vec<PostResponse>>> {
    let posts = state
        .store
        .list_posts(&PostFilter {
            company_id: Some(company.0.clone()),
            status: query.status,
            approval_status: query.approval_status,
        })
        .await?;
    Ok(Json(posts.into_iter().map(PostResponse::from).collect()))
}

/// Fetch one post.
pub async fn get_post(
    State(state): State<AppState>,
    company: CompanyId,
    Path(post_id): Path<String>,
) -> ApiResult<Json<PostResponse>> {
    let post = load_company_post(&state, &company, &post_id).await?;
    Ok(Json(PostResponse::from(post)))
}

/// Reviewer approval of a pending post.
pub async fn approve_post(
    State(state): State<AppState>,
    company: CompanyId,
    Path(post_id): Path<String>,
) -> ApiResult<Json<PostResponse>> {
    let post = load_company_post(&state, &company, &post_id).await?;
    let approved = state.scheduler.approve_post(&post.id).await?;
    Ok(Json(PostResponse::from(approved)))
}

async fn load_company_post(
    state: &AppState,
    company: &CompanyId,
    post_id: &str,
) -> Result<ScheduledPost, StoreError> {
    let id = PostId::from_string(post_id);
    match state.store.get_post(&id).await? {
        Some(p) if p.company_id == company.as_str() => Ok(p),
        _ => Err(StoreError::not_found(format!("post {}", post_id))),
    }
}
