//! Pipeline configuration.

use std::time::Duration;

use clipcast_models::ScoreWeights;

/// Coordinator and ranking configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How often the coordinator polls for stage work
    pub poll_interval: Duration,
    /// Per-stage timeout; a video stuck in one stage longer than this fails
    /// with reason `timeout`
    pub stage_timeout: Duration,
    /// Timeout for a single provider call within a stage
    pub provider_timeout: Duration,
    /// Maximum videos progressing concurrently (bounds provider cost/rate)
    pub max_concurrent_stages: usize,
    /// Retry attempts for transient transcription/analysis errors
    pub provider_retries: u32,
    /// Minimum clip duration in seconds
    pub min_clip_secs: f64,
    /// Maximum clip duration in seconds
    pub max_clip_secs: f64,
    /// Number of candidate clips persisted per analysis run
    pub top_n: usize,
    /// Maximum upload size in bytes
    pub max_upload_bytes: u64,
    /// Composite score weights (equal by default, per-company overrides are
    /// passed through the analyze call)
    pub weights: ScoreWeights,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            stage_timeout: Duration::from_secs(300),
            provider_timeout: Duration::from_secs(120),
            max_concurrent_stages: 4,
            provider_retries: 3,
            min_clip_secs: 10.0,
            max_clip_secs: 90.0,
            top_n: 10,
            max_upload_bytes: 2 * 1024 * 1024 * 1024, // 2 GiB
            weights: ScoreWeights::default(),
        }
    }
}

impl PipelineConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll_interval: Duration::from_secs(
                env_parse("PIPELINE_POLL_INTERVAL_SECS").unwrap_or(2),
            ),
            stage_timeout: Duration::from_secs(
                env_parse("PIPELINE_STAGE_TIMEOUT_SECS").unwrap_or(300),
            ),
            provider_timeout: Duration::from_secs(
                env_parse("PIPELINE_PROVIDER_TIMEOUT_SECS").unwrap_or(120),
            ),
            max_concurrent_stages: env_parse("PIPELINE_MAX_CONCURRENT").unwrap_or(4),
            provider_retries: env_parse("PIPELINE_PROVIDER_RETRIES").unwrap_or(3),
            min_clip_secs: env_parse("PIPELINE_MIN_CLIP_SECS").unwrap_or(defaults.min_clip_secs),
            max_clip_secs: env_parse("PIPELINE_MAX_CLIP_SECS").unwrap_or(defaults.max_clip_secs),
            top_n: env_parse("PIPELINE_TOP_N").unwrap_or(10),
            max_upload_bytes: env_parse("PIPELINE_MAX_UPLOAD_BYTES")
                .unwrap_or(defaults.max_upload_bytes),
            weights: defaults.weights,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
