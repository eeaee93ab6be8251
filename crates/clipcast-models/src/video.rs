//! Video metadata and pipeline status models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};

/// Unique identifier for a source video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct VideoId(pub String);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for VideoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for VideoId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How the source video entered the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
    Upload,
    UrlImport,
}

impl VideoSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoSource::Upload => "upload",
            VideoSource::UrlImport => "url_import",
        }
    }
}

/// Pipeline status of a video.
///
/// Uploads enter at `Processing` (bytes are persisted synchronously by the
/// ingestion gateway); URL imports enter at `Downloading`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VideoStatus {
    /// Waiting on the download adapter to resolve a remote URL
    Downloading,
    /// Media stored, waiting on validation and transcription
    Processing,
    /// Transcript persisted, waiting on virality analysis
    Transcribed,
    /// Candidate clips scored, waiting on clip persistence
    Analyzed,
    /// Pipeline complete, clips available for review
    Ready,
    /// Pipeline failed (see failure reason)
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Downloading => "downloading",
            VideoStatus::Processing => "processing",
            VideoStatus::Transcribed => "transcribed",
            VideoStatus::Analyzed => "analyzed",
            VideoStatus::Ready => "ready",
            VideoStatus::Failed => "failed",
        }
    }

    /// Terminal states receive no further pipeline work.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VideoStatus::Ready | VideoStatus::Failed)
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a video pipeline failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    DownloadError,
    InvalidMedia,
    TranscriptionError,
    AnalysisError,
    Timeout,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::DownloadError => "download_error",
            FailureReason::InvalidMedia => "invalid_media",
            FailureReason::TranscriptionError => "transcription_error",
            FailureReason::AnalysisError => "analysis_error",
            FailureReason::Timeout => "timeout",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A source video owned by a company, driven through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Video {
    /// Unique video ID
    pub id: VideoId,

    /// Owning company (tenant)
    pub company_id: String,

    /// How the video entered the system
    pub source: VideoSource,

    /// Remote URL (URL imports only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,

    /// Pipeline status
    pub status: VideoStatus,

    /// Failure reason (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<FailureReason>,

    /// Human-readable failure detail (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Duration in seconds (known after upload probe or download)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,

    /// Media store reference for the raw bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_ref: Option<String>,

    /// When the current stage was entered (drives per-stage timeouts)
    pub stage_started_at: DateTime<Utc>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Free-form metadata (original filename, probe info, ...)
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Video {
    /// Create a video for an upload whose bytes are already in the media store.
    pub fn new_upload(
        company_id: impl Into<String>,
        media_ref: impl Into<String>,
        duration_secs: Option<f64>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            company_id: company_id.into(),
            source: VideoSource::Upload,
            source_url: None,
            status: VideoStatus::Processing,
            failure_reason: None,
            error_message: None,
            duration_secs,
            media_ref: Some(media_ref.into()),
            stage_started_at: now,
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }

    /// Create a video for a remote-URL import; the download adapter resolves it.
    pub fn new_url_import(company_id: impl Into<String>, source_url: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: VideoId::new(),
            company_id: company_id.into(),
            source: VideoSource::UrlImport,
            source_url: Some(source_url.into()),
            status: VideoStatus::Downloading,
            failure_reason: None,
            error_message: None,
            duration_secs: None,
            media_ref: None,
            stage_started_at: now,
            created_at: now,
            updated_at: now,
            metadata: HashMap::new(),
        }
    }

    /// Advance to the next pipeline stage, resetting the stage clock.
    ///
    /// Only forward transitions in the stage table are legal; anything else
    /// is an `InvalidTransition` error.
    pub fn advance_to(&mut self, next: VideoStatus) -> ModelResult<()> {
        let legal = matches!(
            (self.status, next),
            (VideoStatus::Downloading, VideoStatus::Processing)
                | (VideoStatus::Processing, VideoStatus::Transcribed)
                | (VideoStatus::Transcribed, VideoStatus::Analyzed)
                | (VideoStatus::Analyzed, VideoStatus::Ready)
        );
        if !legal {
            return Err(ModelError::invalid_transition(
                self.status.as_str(),
                next.as_str(),
            ));
        }
        self.status = next;
        let now = Utc::now();
        self.stage_started_at = now;
        self.updated_at = now;
        Ok(())
    }

    /// Mark the pipeline failed. A no-op error for already-terminal videos.
    pub fn fail(&mut self, reason: FailureReason, message: impl Into<String>) -> ModelResult<()> {
        if self.status.is_terminal() {
            return Err(ModelError::invalid_transition(
                self.status.as_str(),
                VideoStatus::Failed.as_str(),
            ));
        }
        self.status = VideoStatus::Failed;
        self.failure_reason = Some(reason);
        self.error_message = Some(message.into());
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Seconds spent in the current stage as of `now`.
    pub fn stage_elapsed(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.stage_started_at
    }
}
