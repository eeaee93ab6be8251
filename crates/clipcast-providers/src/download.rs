//! Download adapter: resolves a remote-URL reference into a stored media
//! object.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::media_store::MediaStore;

/// Result of resolving a remote URL.
#[derive(Debug, Clone)]
pub struct DownloadResult {
    /// Media store reference for the downloaded bytes.
    pub media_ref: String,
    /// Media duration in seconds, when the source reports it. Transcription
    /// backfills the duration when the download cannot determine it.
    pub duration_secs: Option<f64>,
}

/// Resolves a remote URL into a stored media object.
#[async_trait]
pub trait DownloadAdapter: Send + Sync {
    async fn import_from_url(&self, url: &str) -> ProviderResult<DownloadResult>;
}

/// HTTP download adapter: GETs the URL and stores the body in the media store.
///
/// Sources that expose a duration do so via the `x-media-duration-secs`
/// response header (our own edge workers set it); anything else leaves the
/// duration to transcription.
pub struct HttpDownloadAdapter {
    http: reqwest::Client,
    media_store: Arc<dyn MediaStore>,
    max_bytes: u64,
}

/// Response header carrying the media duration in fractional seconds.
pub const DURATION_HEADER: &str = "x-media-duration-secs";

impl HttpDownloadAdapter {
    pub fn new(media_store: Arc<dyn MediaStore>, timeout: Duration, max_bytes: u64) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            media_store,
            max_bytes,
        }
    }
}

#[async_trait]
impl DownloadAdapter for HttpDownloadAdapter {
    async fn import_from_url(&self, url: &str) -> ProviderResult<DownloadResult> {
        let parsed = Url::parse(url)
            .map_err(|e| ProviderError::validation(format!("invalid url {}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ProviderError::validation(format!(
                "unsupported url scheme: {}",
                parsed.scheme()
            )));
        }

        info!(url, "Downloading remote media");

        let response = self
            .http
            .get(parsed)
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?
            .error_for_status()
            .map_err(ProviderError::from_reqwest)?;

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(ProviderError::validation(format!(
                    "remote media is {} bytes, limit is {}",
                    len, self.max_bytes
                )));
            }
        }

        let duration_secs = response
            .headers()
            .get(DURATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<f64>().ok());

        let bytes = response
            .bytes()
            .await
            .map_err(ProviderError::from_reqwest)?;

        if bytes.len() as u64 > self.max_bytes {
            return Err(ProviderError::validation(format!(
                "remote media is {} bytes, limit is {}",
                bytes.len(),
                self.max_bytes
            )));
        }
        if bytes.is_empty() {
            return Err(ProviderError::permanent("remote media is empty"));
        }

        let media_ref = self.media_store.put(bytes.to_vec()).await?;
        if duration_secs.is_none() {
            warn!(url, "Source did not report a duration, deferring to transcription");
        }

        Ok(DownloadResult {
            media_ref,
            duration_secs,
        })
    }
}
