//! Route-level tests driven through the router with `tower::ServiceExt`.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use clipcast_api::{create_router, ApiConfig, AppState};
use clipcast_models::{
    ConnectionStatus, Platform, ScoreWeights, SocialAccount, Transcript, ViralitySubScores,
};
use clipcast_pipeline::{IngestGateway, PipelineConfig, PipelineCoordinator};
use clipcast_providers::{
    Candidate, DownloadAdapter, DownloadResult, MemoryMediaStore, ProviderResult,
    TranscriptionAdapter, TranscriptionOutput, ViralityAnalyzer,
};
use clipcast_publish::SchedulingService;
use clipcast_store::{
    ClipRepository, MemoryStore, SocialAccountRepository, Store, VideoRepository,
};

struct NullDownloader;

#[async_trait]
impl DownloadAdapter for NullDownloader {
    async fn import_from_url(&self, _url: &str) -> ProviderResult<DownloadResult> {
        Ok(DownloadResult {
            media_ref: "media-dl".into(),
            duration_secs: None,
        })
    }
}

struct NullTranscriber;

#[async_trait]
impl TranscriptionAdapter for NullTranscriber {
    async fn transcribe(&self, _media_ref: &str) -> ProviderResult<TranscriptionOutput> {
        Ok(TranscriptionOutput::default())
    }
}

struct NullAnalyzer;

#[async_trait]
impl ViralityAnalyzer for NullAnalyzer {
    async fn analyze(
        &self,
        _transcript: &Transcript,
        _media_ref: &str,
        _weights: Option<&ScoreWeights>,
    ) -> ProviderResult<Vec<Candidate>> {
        Ok(vec![])
    }
}

fn test_app() -> (Arc<MemoryStore>, axum::Router) {
    let store = Arc::new(MemoryStore::new());
    let media_store = Arc::new(MemoryMediaStore::new());
    let gateway = Arc::new(IngestGateway::new(
        store.clone() as Arc<dyn Store>,
        media_store,
        64 * 1024,
    ));
    let coordinator = Arc::new(PipelineCoordinator::new(
        store.clone() as Arc<dyn Store>,
        Arc::new(NullDownloader),
        Arc::new(NullTranscriber),
        None,
        Arc::new(NullAnalyzer),
        PipelineConfig::default(),
    ));
    let scheduler = Arc::new(SchedulingService::new(store.clone() as Arc<dyn Store>));
    let state = AppState::new(
        ApiConfig::default(),
        store.clone() as Arc<dyn Store>,
        gateway,
        scheduler,
        coordinator,
    );
    (store, create_router(state, None))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (_, app) = test_app();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_upload_requires_company_header() {
    let (_, app) = test_app();
    let response = app
        .oneshot(
            Request::post("/api/videos/upload")
                .header(header::CONTENT_TYPE, "video/mp4")
                .body(Body::from(vec![1u8, 2, 3]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_and_poll_status() {
    let (_, app) = test_app();
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/videos/upload")
                .header("x-company-id", "acme")
                .header(header::CONTENT_TYPE, "video/mp4")
                .header("x-filename", "talk.mp4")
                .body(Body::from(vec![1u8, 2, 3]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "processing");
    let id = body["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::get(format!("/api/videos/{}", id))
                .header("x-company-id", "acme")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "processing");
    assert_eq!(body["clip_count"], 0);
}

#[tokio::test]
async fn test_unsupported_media_type_rejected() {
    let (_, app) = test_app();
    let response = app
        .oneshot(
            Request::post("/api/videos/upload")
                .header("x-company-id", "acme")
                .header(header::CONTENT_TYPE, "image/png")
                .body(Body::from(vec![1u8]))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_import_rejects_bad_url() {
    let (_, app) = test_app();
    let response = app
        .oneshot(
            Request::post("/api/videos/import")
                .header("x-company-id", "acme")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({"url": "not-a-url"}).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_cross_company_access_reads_as_not_found() {
    let (_, app) = test_app();
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/videos/upload")
                .header("x-company-id", "acme")
                .header(header::CONTENT_TYPE, "video/mp4")
                .body(Body::from(vec![1u8]))
                .unwrap(),
        )
        .await
        .unwrap();
    let id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(
            Request::get(format!("/api/videos/{}", id))
                .header("x-company-id", "rival")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_review_flow_and_double_review_conflict() {
    let (store, app) = test_app();

    // Seed a video with one pending clip
    let video = clipcast_models::Video::new_upload("acme", "media-raw", Some(120.0));
    let video_id = video.id.clone();
    store.create_video(video).await.unwrap();
    let now = chrono::Utc::now();
    let clip = clipcast_models::Clip {
        id: clipcast_models::ClipId::new(),
        video_id: video_id.clone(),
        company_id: "acme".into(),
        start_secs: 0.0,
        end_secs: 30.0,
        virality_score: 70,
        sub_scores: ViralitySubScores::default(),
        aspect_ratio: Default::default(),
        caption_style: Default::default(),
        ai_title: "Hook".into(),
        ai_description: None,
        transcript_excerpt: String::new(),
        status: Default::default(),
        created_at: now,
        updated_at: now,
    };
    let clip_id = clip.id.clone();
    store.replace_analysis_clips(&video_id, vec![clip]).await.unwrap();

    let review = |app: axum::Router, decision: &str| {
        let uri = format!("/api/clips/{}/review", clip_id);
        let body = json!({"decision": decision}).to_string();
        async move {
            app.oneshot(
                Request::post(uri)
                    .header("x-company-id", "acme")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
        }
    };

    let response = review(app.clone(), "approve").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "approved");

    // A second decision on the same clip is a conflict
    let response = review(app, "reject").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_post_requires_connected_account() {
    let (store, app) = test_app();
    store
        .upsert_account(SocialAccount::new(
            "acme",
            Platform::Tiktok,
            ConnectionStatus::Connected,
        ))
        .await
        .unwrap();

    // Youtube has no connected account
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/posts")
                .header("x-company-id", "acme")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "platforms": ["tiktok", "youtube"],
                        "media_ref": "media-adhoc",
                        "publish_now": true
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Ad-hoc post on the connected platform only
    let response = app
        .clone()
        .oneshot(
            Request::post("/api/posts")
                .header("x-company-id", "acme")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({
                        "platforms": ["tiktok"],
                        "media_ref": "media-adhoc",
                        "publish_now": true,
                        "auto_approve": true
                    })
                    .to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "scheduled");
    assert_eq!(body["approval_status"], "approved");

    let response = app
        .oneshot(
            Request::get("/api/posts")
                .header("x-company-id", "acme")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}
