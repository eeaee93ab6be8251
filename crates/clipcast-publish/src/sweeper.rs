//! Dispatch sweeper: periodically claims due posts and delivers them to
//! their target platforms.
//!
//! Claiming is a conditional `scheduled -> publishing` update in the store,
//! so concurrent sweep instances never dispatch the same post twice. Each
//! platform delivery is independent: delivered platforms are remembered in
//! the post's per-platform results and never re-sent by a later attempt.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use clipcast_models::{PostStatus, ScheduledPost};
use clipcast_providers::PublisherRegistry;
use clipcast_store::{Store, StoreError};

use crate::config::PublishConfig;
use crate::error::PublishResult;

mod metric {
    pub const POSTS_PUBLISHED: &str = "clipcast_posts_published_total";
    pub const POSTS_FAILED: &str = "clipcast_posts_failed_total";
    pub const DISPATCH_RETRIES: &str = "clipcast_dispatch_retries_total";
    pub const PLATFORM_DELIVERIES: &str = "clipcast_platform_deliveries_total";
}

pub struct DispatchSweeper {
    store: Arc<dyn Store>,
    registry: PublisherRegistry,
    config: PublishConfig,
}

impl DispatchSweeper {
    pub fn new(store: Arc<dyn Store>, registry: PublisherRegistry, config: PublishConfig) -> Self {
        Self {
            store,
            registry,
            config,
        }
    }

    /// Run the sweep loop until shutdown is signalled.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.sweep_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            sweep_interval_secs = self.config.sweep_interval.as_secs(),
            "Dispatch sweeper started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.sweep_once(Utc::now()).await {
                        Ok(0) => {}
                        Ok(n) => info!(posts = n, "Dispatch sweep complete"),
                        Err(e) => warn!(error = %e, "Dispatch sweep failed"),
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Dispatch sweeper shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One sweep pass: claim due posts and dispatch each. Returns the number
    /// of posts dispatched.
    pub async fn sweep_once(&self, now: DateTime<Utc>) -> PublishResult<usize> {
        let claimed = self
            .store
            .claim_due_posts(now, self.config.claim_batch)
            .await?;
        let count = claimed.len();

        for post in claimed {
            let id = post.id.clone();
            let outcome = self.dispatch(post, now).await;
            match self.store.save_dispatch_outcome(outcome).await {
                Ok(()) => {}
                // The post was deleted or invalidated while we held the claim
                Err(StoreError::Conflict(_)) | Err(StoreError::NotFound(_)) => {
                    warn!(post_id = %id, "Dispatch outcome discarded, post changed mid-flight");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(count)
    }

    /// Deliver one claimed post to every platform still awaiting delivery and
    /// compute its next status.
    async fn dispatch(&self, mut post: ScheduledPost, now: DateTime<Utc>) -> ScheduledPost {
        let mut permanent_failure: Option<String> = None;
        let mut last_error: Option<String> = None;

        for platform in post.undelivered_platforms() {
            let delivery = self.deliver_one(&post, platform).await;
            match delivery {
                Ok(external_post_id) => {
                    counter!(
                        metric::PLATFORM_DELIVERIES,
                        "platform" => platform.as_str(),
                        "outcome" => "delivered"
                    )
                    .increment(1);
                    post.record_delivered(platform, external_post_id);
                }
                Err(DeliveryError { message, permanent }) => {
                    counter!(
                        metric::PLATFORM_DELIVERIES,
                        "platform" => platform.as_str(),
                        "outcome" => "error"
                    )
                    .increment(1);
                    warn!(
                        post_id = %post.id,
                        platform = %platform,
                        permanent,
                        error = %message,
                        "Platform delivery failed"
                    );
                    post.record_delivery_error(platform, message.clone());
                    if permanent {
                        permanent_failure = Some(message);
                    } else {
                        last_error = Some(message);
                    }
                }
            }
        }

        if post.all_delivered() {
            post.status = PostStatus::Published;
            post.posted_at = Some(now);
            post.error_message = None;
            counter!(metric::POSTS_PUBLISHED).increment(1);
            info!(post_id = %post.id, "Post published to all platforms");
        } else if let Some(message) = permanent_failure {
            post.status = PostStatus::Failed;
            post.error_message = Some(message);
            counter!(metric::POSTS_FAILED, "reason" => "permanent").increment(1);
        } else {
            post.retry_count += 1;
            post.error_message = last_error;
            if post.retry_count > self.config.max_publish_retries {
                post.status = PostStatus::Failed;
                counter!(metric::POSTS_FAILED, "reason" => "retries_exhausted").increment(1);
                warn!(
                    post_id = %post.id,
                    retry_count = post.retry_count,
                    "Post failed, retry budget exhausted"
                );
            } else {
                // Release for a later sweep; delivered platforms stay
                // recorded and are skipped next time.
                post.status = PostStatus::Scheduled;
                counter!(metric::DISPATCH_RETRIES).increment(1);
            }
        }
        post.updated_at = Utc::now();
        post
    }

    async fn deliver_one(
        &self,
        post: &ScheduledPost,
        platform: clipcast_models::Platform,
    ) -> Result<Option<String>, DeliveryError> {
        let adapter = self.registry.get(platform).map_err(|e| DeliveryError {
            message: e.to_string(),
            permanent: true,
        })?;
        let account = self
            .store
            .find_connected_account(&post.company_id, platform)
            .await
            .map_err(|e| DeliveryError {
                message: e.to_string(),
                permanent: false,
            })?
            .ok_or_else(|| DeliveryError {
                message: format!("no connected {} account", platform),
                permanent: true,
            })?;

        match tokio::time::timeout(
            self.config.publish_timeout,
            adapter.publish(&account, &post.content, post.media_ref.as_deref()),
        )
        .await
        {
            Ok(Ok(outcome)) => Ok(outcome.external_post_id),
            Ok(Err(e)) => Err(DeliveryError {
                permanent: !e.is_retryable(),
                message: e.to_string(),
            }),
            Err(_elapsed) => Err(DeliveryError {
                message: format!("publish to {} timed out", platform),
                permanent: false,
            }),
        }
    }
}

struct DeliveryError {
    message: String,
    permanent: bool,
}
