//! HTTP clients for the external transcription, analysis, and publishing
//! services.
//!
//! The pipeline only knows the adapter traits; these clients bind them to
//! sidecar services speaking a small JSON protocol, configured by URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

use clipcast_models::{
    Platform, PostContent, ScoreWeights, Segment, SocialAccount, Transcript, ViralitySubScores,
    Word,
};
use clipcast_providers::{
    Candidate, MediaNormalizer, ProviderError, ProviderResult, PublishAdapter, PublishOutcome,
    PublisherRegistry, TranscriptionAdapter, TranscriptionOutput, ViralityAnalyzer,
};

fn service_client(timeout: Duration) -> Client {
    Client::builder().timeout(timeout).build().unwrap_or_default()
}

/// Client for the transcription sidecar.
pub struct TranscriptionServiceClient {
    base_url: String,
    http: Client,
}

#[derive(Serialize)]
struct TranscribeRequest<'a> {
    media_ref: &'a str,
}

#[derive(Deserialize)]
struct TranscribeResponse {
    #[serde(default)]
    full_text: String,
    #[serde(default)]
    language: String,
    #[serde(default)]
    duration_secs: f64,
    #[serde(default)]
    words: Vec<Word>,
    #[serde(default)]
    segments: Vec<Segment>,
}

impl TranscriptionServiceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            http: service_client(timeout),
        }
    }
}

#[async_trait]
impl TranscriptionAdapter for TranscriptionServiceClient {
    async fn transcribe(&self, media_ref: &str) -> ProviderResult<TranscriptionOutput> {
        let url = format!("{}/v1/transcribe", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&TranscribeRequest { media_ref })
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?
            .error_for_status()
            .map_err(ProviderError::from_reqwest)?;

        let body: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::permanent(format!("malformed transcription body: {}", e)))?;
        Ok(TranscriptionOutput {
            full_text: body.full_text,
            language: body.language,
            duration_secs: body.duration_secs,
            words: body.words,
            segments: body.segments,
        })
    }
}

#[async_trait]
impl MediaNormalizer for TranscriptionServiceClient {
    async fn normalize(&self, media_ref: &str) -> ProviderResult<String> {
        let url = format!("{}/v1/normalize", self.base_url);

        #[derive(Deserialize)]
        struct NormalizeResponse {
            media_ref: String,
        }

        let response = self
            .http
            .post(&url)
            .json(&TranscribeRequest { media_ref })
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?
            .error_for_status()
            .map_err(ProviderError::from_reqwest)?;
        let body: NormalizeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::permanent(format!("malformed normalize body: {}", e)))?;
        Ok(body.media_ref)
    }
}

/// Client for the virality analysis sidecar.
pub struct AnalyzerServiceClient {
    base_url: String,
    http: Client,
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    transcript: &'a Transcript,
    media_ref: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    weights: Option<&'a ScoreWeights>,
}

#[derive(Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    candidates: Vec<CandidateDto>,
}

#[derive(Deserialize)]
struct CandidateDto {
    start_secs: f64,
    end_secs: f64,
    sub_scores: SubScoresDto,
    ai_title: String,
    #[serde(default)]
    ai_description: Option<String>,
}

#[derive(Deserialize)]
struct SubScoresDto {
    hook: u8,
    emotion: u8,
    insight: u8,
    call_to_action: u8,
    quality: u8,
}

impl AnalyzerServiceClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            http: service_client(timeout),
        }
    }
}

#[async_trait]
impl ViralityAnalyzer for AnalyzerServiceClient {
    async fn analyze(
        &self,
        transcript: &Transcript,
        media_ref: &str,
        weights: Option<&ScoreWeights>,
    ) -> ProviderResult<Vec<Candidate>> {
        let url = format!("{}/v1/analyze", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&AnalyzeRequest {
                transcript,
                media_ref,
                weights,
            })
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?
            .error_for_status()
            .map_err(ProviderError::from_reqwest)?;

        let body: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::permanent(format!("malformed analysis body: {}", e)))?;
        Ok(body
            .candidates
            .into_iter()
            .map(|c| Candidate {
                start_secs: c.start_secs,
                end_secs: c.end_secs,
                sub_scores: ViralitySubScores {
                    hook: c.sub_scores.hook,
                    emotion: c.sub_scores.emotion,
                    insight: c.sub_scores.insight,
                    call_to_action: c.sub_scores.call_to_action,
                    quality: c.sub_scores.quality,
                },
                ai_title: c.ai_title,
                ai_description: c.ai_description,
            })
            .collect())
    }
}

/// Publishes to one platform through its delivery webhook.
pub struct WebhookPublisher {
    platform: Platform,
    endpoint: String,
    http: Client,
}

#[derive(Serialize)]
struct PublishRequest<'a> {
    platform: &'a str,
    account_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    handle: Option<&'a str>,
    content: &'a PostContent,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_ref: Option<&'a str>,
}

#[derive(Deserialize)]
struct PublishResponse {
    #[serde(default)]
    external_post_id: Option<String>,
}

impl WebhookPublisher {
    pub fn new(platform: Platform, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            platform,
            endpoint: endpoint.into(),
            http: service_client(timeout),
        }
    }
}

#[async_trait]
impl PublishAdapter for WebhookPublisher {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn publish(
        &self,
        account: &SocialAccount,
        content: &PostContent,
        media_ref: Option<&str>,
    ) -> ProviderResult<PublishOutcome> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&PublishRequest {
                platform: self.platform.as_str(),
                account_id: &account.id,
                handle: account.handle.as_deref(),
                content,
                media_ref,
            })
            .send()
            .await
            .map_err(ProviderError::from_reqwest)?
            .error_for_status()
            .map_err(ProviderError::from_reqwest)?;

        let body: PublishResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::permanent(format!("malformed publish body: {}", e)))?;
        Ok(PublishOutcome {
            external_post_id: body.external_post_id,
        })
    }
}

/// Build the publisher registry from `PUBLISH_WEBHOOK_<PLATFORM>` env vars.
pub fn publisher_registry_from_env(timeout: Duration) -> PublisherRegistry {
    let platforms = [
        Platform::Tiktok,
        Platform::Instagram,
        Platform::Youtube,
        Platform::Twitter,
        Platform::Linkedin,
        Platform::Facebook,
    ];

    let mut registry = PublisherRegistry::new();
    for platform in platforms {
        let var = format!("PUBLISH_WEBHOOK_{}", platform.as_str().to_uppercase());
        if let Ok(endpoint) = std::env::var(&var) {
            info!(platform = %platform, "Registered publish webhook");
            registry = registry.register(std::sync::Arc::new(WebhookPublisher::new(
                platform, endpoint, timeout,
            )));
        }
    }
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_transcription_client_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/transcribe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "full_text": "hello world",
                "language": "en",
                "duration_secs": 12.5,
                "segments": [
                    {"text": "hello world", "start_secs": 0.0, "end_secs": 2.0}
                ]
            })))
            .mount(&server)
            .await;

        let client = TranscriptionServiceClient::new(server.uri(), Duration::from_secs(5));
        let output = client.transcribe("media-1").await.unwrap();
        assert_eq!(output.full_text, "hello world");
        assert_eq!(output.duration_secs, 12.5);
        assert_eq!(output.segments.len(), 1);
        assert!(output.words.is_empty());
    }

    #[tokio::test]
    async fn test_transcription_5xx_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/transcribe"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = TranscriptionServiceClient::new(server.uri(), Duration::from_secs(5));
        let err = client.transcribe("media-1").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_analyzer_unsupported_input_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/analyze"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;

        let client = AnalyzerServiceClient::new(server.uri(), Duration::from_secs(5));
        let transcript = Transcript::empty(clipcast_models::VideoId::new(), 10.0);
        let err = client
            .analyze(&transcript, "media-1", None)
            .await
            .unwrap_err();
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_webhook_publisher_delivers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "external_post_id": "yt-99"
            })))
            .mount(&server)
            .await;

        let publisher =
            WebhookPublisher::new(Platform::Youtube, server.uri(), Duration::from_secs(5));
        let account = SocialAccount::new(
            "acme",
            Platform::Youtube,
            clipcast_models::ConnectionStatus::Connected,
        );
        let outcome = publisher
            .publish(&account, &PostContent::default(), Some("media-1"))
            .await
            .unwrap();
        assert_eq!(outcome.external_post_id.as_deref(), Some("yt-99"));
    }
}
