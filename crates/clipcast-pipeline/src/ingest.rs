//! Ingestion gateway: the only entry points that create videos.
//!
//! All validation happens before any entity is created or any byte is stored,
//! so a rejected request leaves no trace. Callers get the video id back
//! immediately; the coordinator drives everything after that.

use std::sync::Arc;

use tracing::info;
use url::Url;

use clipcast_models::Video;
use clipcast_providers::MediaStore;
use clipcast_store::Store;

use crate::error::{PipelineError, PipelineResult};

/// Media types accepted for direct upload.
pub const ALLOWED_MEDIA_TYPES: [&str; 4] = [
    "video/mp4",
    "video/quicktime",
    "video/webm",
    "video/x-matroska",
];

pub struct IngestGateway {
    store: Arc<dyn Store>,
    media_store: Arc<dyn MediaStore>,
    max_upload_bytes: u64,
}

impl IngestGateway {
    pub fn new(
        store: Arc<dyn Store>,
        media_store: Arc<dyn MediaStore>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            store,
            media_store,
            max_upload_bytes,
        }
    }

    /// Accept an uploaded video: store the bytes synchronously and create the
    /// video in `processing`. Duration is optional; transcription backfills
    /// it when the uploader cannot provide one.
    pub async fn create_video_from_upload(
        &self,
        company_id: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
        duration_secs: Option<f64>,
    ) -> PipelineResult<Video> {
        if company_id.trim().is_empty() {
            return Err(PipelineError::validation("company_id is required"));
        }
        let media_type = normalize_media_type(content_type);
        if !ALLOWED_MEDIA_TYPES.contains(&media_type.as_str()) {
            return Err(PipelineError::validation(format!(
                "unsupported media type: {}",
                content_type
            )));
        }
        if bytes.is_empty() {
            return Err(PipelineError::validation("upload body is empty"));
        }
        if bytes.len() as u64 > self.max_upload_bytes {
            return Err(PipelineError::validation(format!(
                "upload is {} bytes (max {})",
                bytes.len(),
                self.max_upload_bytes
            )));
        }
        if let Some(d) = duration_secs {
            if !d.is_finite() || d <= 0.0 {
                return Err(PipelineError::validation(format!(
                    "invalid duration: {}",
                    d
                )));
            }
        }

        let size = bytes.len();
        let media_ref = self.media_store.put(bytes).await?;

        let mut video = Video::new_upload(company_id, media_ref, duration_secs);
        video
            .metadata
            .insert("filename".to_string(), filename.to_string());
        video
            .metadata
            .insert("content_type".to_string(), media_type);
        self.store.create_video(video.clone()).await?;

        info!(
            video_id = %video.id,
            company_id,
            size_bytes = size,
            "Accepted video upload"
        );
        Ok(video)
    }

    /// Accept a remote-URL import: create the video in `downloading` and
    /// return immediately. The coordinator hands the URL to the download
    /// adapter on its next tick.
    pub async fn create_video_from_url(
        &self,
        company_id: &str,
        source_url: &str,
    ) -> PipelineResult<Video> {
        if company_id.trim().is_empty() {
            return Err(PipelineError::validation("company_id is required"));
        }
        let parsed = Url::parse(source_url)
            .map_err(|e| PipelineError::validation(format!("invalid url: {}", e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(PipelineError::validation(format!(
                "unsupported url scheme: {}",
                parsed.scheme()
            )));
        }

        let video = Video::new_url_import(company_id, source_url);
        self.store.create_video(video.clone()).await?;

        info!(
            video_id = %video.id,
            company_id,
            url = source_url,
            "Accepted video url import"
        );
        Ok(video)
    }
}

/// Lowercase the media type and strip any `; charset=...` style parameters.
fn normalize_media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}
