//! Video API handlers.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use clipcast_models::{ClipStatus, ScoreWeights, Video, VideoId};
use clipcast_pipeline::PipelineError;

use crate::company::CompanyId;
use crate::error::{ApiError, ApiResult};
use crate::metrics::record_video_created;
use crate::state::AppState;

/// Header carrying the original filename of an upload.
pub const FILENAME_HEADER: &str = "x-filename";
/// Header carrying the media duration in fractional seconds, when the
/// uploader knows it.
pub const DURATION_HEADER: &str = "x-media-duration-secs";

#[derive(Serialize)]
pub struct VideoCreatedResponse {
    pub id: String,
    pub status: String,
}

impl From<&Video> for VideoCreatedResponse {
    fn from(video: &Video) -> Self {
        Self {
            id: video.id.to_string(),
            status: video.status.to_string(),
        }
    }
}

/// Accept a raw video upload. Bytes are persisted before the request
/// returns; the pipeline takes over asynchronously.
pub async fn upload_video(
    State(state): State<AppState>,
    company: CompanyId,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<VideoCreatedResponse>)> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let filename = headers
        .get(FILENAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("upload")
        .to_string();
    let duration_secs = headers
        .get(DURATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<f64>().ok());

    let video = state
        .gateway
        .create_video_from_upload(
            company.as_str(),
            &filename,
            &content_type,
            body.to_vec(),
            duration_secs,
        )
        .await?;

    record_video_created("upload");
    Ok((StatusCode::CREATED, Json(VideoCreatedResponse::from(&video))))
}

#[derive(Deserialize, Validate)]
pub struct ImportRequest {
    #[validate(url)]
    pub url: String,
}

/// Accept a remote-URL import.
pub async fn import_video(
    State(state): State<AppState>,
    company: CompanyId,
    Json(req): Json<ImportRequest>,
) -> ApiResult<(StatusCode, Json<VideoCreatedResponse>)> {
    req.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let video = state
        .gateway
        .create_video_from_url(company.as_str(), &req.url)
        .await?;

    record_video_created("url_import");
    Ok((StatusCode::CREATED, Json(VideoCreatedResponse::from(&video))))
}

#[derive(Serialize)]
pub struct VideoStatusResponse {
    pub id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    pub clip_count: usize,
    pub pending_review_count: usize,
    pub created_at: String,
    pub updated_at: String,
}

/// Video status with clip counts, for polling.
pub async fn get_video_status(
    State(state): State<AppState>,
    company: CompanyId,
    Path(video_id): Path<String>,
) -> ApiResult<Json<VideoStatusResponse>> {
    let video = load_company_video(&state, &company, &video_id).await?;
    let clips = state.store.list_clips(&video.id).await?;
    let pending = clips
        .iter()
        .filter(|c| c.status == ClipStatus::PendingReview)
        .count();

    Ok(Json(VideoStatusResponse {
        id: video.id.to_string(),
        status: video.status.to_string(),
        failure_reason: video.failure_reason.map(|r| r.to_string()),
        error_message: video.error_message,
        duration_secs: video.duration_secs,
        clip_count: clips.len(),
        pending_review_count: pending,
        created_at: video.created_at.to_rfc3339(),
        updated_at: video.updated_at.to_rfc3339(),
    }))
}

/// Delete a video; the transcript, clips, and unpublished referencing posts
/// go with it.
pub async fn delete_video(
    State(state): State<AppState>,
    company: CompanyId,
    Path(video_id): Path<String>,
) -> ApiResult<StatusCode> {
    let video = load_company_video(&state, &company, &video_id).await?;
    state.store.delete_video(&video.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize, Default)]
pub struct ReanalyzeRequest {
    pub weights: Option<ScoreWeights>,
}

#[derive(Serialize)]
pub struct ReanalyzeResponse {
    pub removed: usize,
    pub inserted: usize,
    pub protected: usize,
}

/// Re-run virality analysis for a ready video. Approved and scheduled clips
/// are never touched.
pub async fn reanalyze_video(
    State(state): State<AppState>,
    company: CompanyId,
    Path(video_id): Path<String>,
    body: Option<Json<ReanalyzeRequest>>,
) -> ApiResult<Json<ReanalyzeResponse>> {
    let video = load_company_video(&state, &company, &video_id).await?;
    let req = body.map(|Json(r)| r).unwrap_or_default();

    let outcome = state.coordinator.reanalyze(&video.id, req.weights).await?;
    Ok(Json(ReanalyzeResponse {
        removed: outcome.removed,
        inserted: outcome.inserted,
        protected: outcome.protected,
    }))
}

/// Fetch a video, scoped to the calling company. Cross-tenant ids read as
/// not-found, never as forbidden.
pub async fn load_company_video(
    state: &AppState,
    company: &CompanyId,
    video_id: &str,
) -> Result<Video, PipelineError> {
    let id = VideoId::from_string(video_id);
    match state.store.get_video(&id).await? {
        Some(v) if v.company_id == company.as_str() => Ok(v),
        _ => Err(clipcast_store::StoreError::not_found(format!("video {}", video_id)).into()),
    }
}
