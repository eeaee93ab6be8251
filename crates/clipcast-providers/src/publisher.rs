//! Publish adapter contract: platform-specific network delivery of a post.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use clipcast_models::{Platform, PostContent, SocialAccount};

use crate::error::{ProviderError, ProviderResult};

/// Successful delivery to one platform.
#[derive(Debug, Clone)]
pub struct PublishOutcome {
    /// Platform-side identifier of the created post.
    pub external_post_id: Option<String>,
}

/// Delivers a content package to one social platform.
#[async_trait]
pub trait PublishAdapter: Send + Sync {
    /// The platform this adapter delivers to.
    fn platform(&self) -> Platform;

    /// Publish the content. `Transient` failures are retried by a later
    /// sweep; `Permanent` failures fail the post immediately.
    async fn publish(
        &self,
        account: &SocialAccount,
        content: &PostContent,
        media_ref: Option<&str>,
    ) -> ProviderResult<PublishOutcome>;
}

/// Registry of publish adapters keyed by platform.
#[derive(Default, Clone)]
pub struct PublisherRegistry {
    adapters: HashMap<Platform, Arc<dyn PublishAdapter>>,
}

impl PublisherRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, adapter: Arc<dyn PublishAdapter>) -> Self {
        self.adapters.insert(adapter.platform(), adapter);
        self
    }

    pub fn get(&self, platform: Platform) -> ProviderResult<Arc<dyn PublishAdapter>> {
        self.adapters.get(&platform).cloned().ok_or_else(|| {
            ProviderError::permanent(format!("no publish adapter registered for {}", platform))
        })
    }

    pub fn platforms(&self) -> Vec<Platform> {
        self.adapters.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullAdapter(Platform);

    #[async_trait]
    impl PublishAdapter for NullAdapter {
        fn platform(&self) -> Platform {
            self.0
        }

        async fn publish(
            &self,
            _account: &SocialAccount,
            _content: &PostContent,
            _media_ref: Option<&str>,
        ) -> ProviderResult<PublishOutcome> {
            Ok(PublishOutcome {
                external_post_id: Some("ext-1".into()),
            })
        }
    }

    #[test]
    fn test_registry_lookup() {
        let registry = PublisherRegistry::new()
            .register(Arc::new(NullAdapter(Platform::Tiktok)))
            .register(Arc::new(NullAdapter(Platform::Youtube)));

        assert!(registry.get(Platform::Tiktok).is_ok());
        assert!(registry.get(Platform::Instagram).is_err());
        assert_eq!(registry.platforms().len(), 2);
    }
}
