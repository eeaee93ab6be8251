//! Publishing configuration.

use std::time::Duration;

/// Scheduling and dispatch configuration.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// How often the dispatch sweep runs
    pub sweep_interval: Duration,
    /// Per-platform publish call timeout
    pub publish_timeout: Duration,
    /// Dispatch attempts leaving undelivered platforms before the post fails
    pub max_publish_retries: u32,
    /// Maximum posts claimed per sweep
    pub claim_batch: usize,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(60),
            publish_timeout: Duration::from_secs(30),
            max_publish_retries: 3,
            claim_batch: 20,
        }
    }
}

impl PublishConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            sweep_interval: Duration::from_secs(env_parse("PUBLISH_SWEEP_INTERVAL_SECS").unwrap_or(60)),
            publish_timeout: Duration::from_secs(env_parse("PUBLISH_TIMEOUT_SECS").unwrap_or(30)),
            max_publish_retries: env_parse("PUBLISH_MAX_RETRIES").unwrap_or(3),
            claim_batch: env_parse("PUBLISH_CLAIM_BATCH").unwrap_or(20),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
