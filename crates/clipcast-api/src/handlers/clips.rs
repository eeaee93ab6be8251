//! Clip review handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use clipcast_models::{Clip, ClipId, ReviewDecision};
use clipcast_store::StoreError;

use crate::company::CompanyId;
use crate::error::ApiResult;
use crate::handlers::videos::load_company_video;
use crate::metrics::record_clip_review;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ClipResponse {
    pub id: String,
    pub video_id: String,
    pub start_secs: f64,
    pub end_secs: f64,
    pub virality_score: u8,
    pub sub_scores: clipcast_models::ViralitySubScores,
    pub status: String,
    pub ai_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_description: Option<String>,
    pub transcript_excerpt: String,
}

impl From<Clip> for ClipResponse {
    fn from(clip: Clip) -> Self {
        Self {
            id: clip.id.to_string(),
            video_id: clip.video_id.to_string(),
            start_secs: clip.start_secs,
            end_secs: clip.end_secs,
            virality_score: clip.virality_score,
            sub_scores: clip.sub_scores,
            status: clip.status.to_string(),
            ai_title: clip.ai_title,
            ai_description: clip.ai_description,
            transcript_excerpt: clip.transcript_excerpt,
        }
    }
}

/// Clips for a video, highest virality score first.
pub async fn list_video_clips(
    State(state): State<AppState>,
    company: CompanyId,
    Path(video_id): Path<String>,
) -> ApiResult<Json<Vec<ClipResponse>>> {
    let video = load_company_video(&state, &company, &video_id).await?;
    let clips = state.store.list_clips(&video.id).await?;
    Ok(Json(clips.into_iter().map(ClipResponse::from).collect()))
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub decision: ReviewDecision,
}

/// Apply a reviewer decision to a pending clip.
pub async fn review_clip(
    State(state): State<AppState>,
    company: CompanyId,
    Path(clip_id): Path<String>,
    Json(req): Json<ReviewRequest>,
) -> ApiResult<Json<ClipResponse>> {
    let id = load_company_clip_id(&state, &company, &clip_id).await?;
    let clip = state.store.review_clip(&id, req.decision).await?;

    record_clip_review(match req.decision {
        ReviewDecision::Approve => "approve",
        ReviewDecision::Reject => "reject",
    });
    Ok(Json(ClipResponse::from(clip)))
}

/// Delete a clip. Unpublished posts referencing it are invalidated.
pub async fn delete_clip(
    State(state): State<AppState>,
    company: CompanyId,
    Path(clip_id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = load_company_clip_id(&state, &company, &clip_id).await?;
    state.store.delete_clip(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn load_company_clip_id(
    state: &AppState,
    company: &CompanyId,
    clip_id: &str,
) -> Result<ClipId, StoreError> {
    let id = ClipId::from_string(clip_id);
    match state.store.get_clip(&id).await? {
        Some(c) if c.company_id == company.as_str() => Ok(id),
        _ => Err(StoreError::not_found(format!("clip {}", clip_id))),
    }
}
