//! End-to-end pipeline tests against the in-memory store and fake adapters.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Notify;

use clipcast_models::{
    ClipStatus, FailureReason, ReviewDecision, Segment, Video, VideoId, VideoStatus,
    ViralitySubScores,
};
use clipcast_providers::{
    Candidate, DownloadAdapter, DownloadResult, MediaNormalizer, ProviderError, ProviderResult,
    TranscriptionAdapter, TranscriptionOutput, ViralityAnalyzer,
};
use clipcast_store::{
    ClipRepository, MemoryStore, Store, TranscriptRepository, VideoRepository,
};
use clipcast_pipeline::{PipelineConfig, PipelineCoordinator};

struct FakeDownloader {
    fail: bool,
    calls: AtomicU32,
}

#[async_trait]
impl DownloadAdapter for FakeDownloader {
    async fn import_from_url(&self, _url: &str) -> ProviderResult<DownloadResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::transient("origin unreachable"));
        }
        Ok(DownloadResult {
            media_ref: "media-dl".to_string(),
            duration_secs: Some(120.0),
        })
    }
}

struct FakeTranscriber {
    /// Media refs that get a permanent "unsupported codec" rejection.
    reject_refs: Vec<&'static str>,
    empty: bool,
    gate: Option<Arc<Notify>>,
    calls: AtomicU32,
}

impl FakeTranscriber {
    fn ok() -> Self {
        Self {
            reject_refs: vec![],
            empty: false,
            gate: None,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl TranscriptionAdapter for FakeTranscriber {
    async fn transcribe(&self, media_ref: &str) -> ProviderResult<TranscriptionOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.reject_refs.contains(&media_ref) {
            return Err(ProviderError::permanent("unsupported codec"));
        }
        if self.empty {
            return Ok(TranscriptionOutput {
                duration_secs: 120.0,
                ..Default::default()
            });
        }
        Ok(TranscriptionOutput {
            full_text: "welcome to the show here is the big insight".to_string(),
            language: "en".to_string(),
            duration_secs: 120.0,
            words: vec![],
            segments: vec![
                Segment {
                    text: "welcome to the show".into(),
                    start_secs: 0.0,
                    end_secs: 40.0,
                },
                Segment {
                    text: "here is the big insight".into(),
                    start_secs: 40.0,
                    end_secs: 110.0,
                },
            ],
        })
    }
}

struct FakeNormalizer {
    fail: bool,
    calls: AtomicU32,
}

#[async_trait]
impl MediaNormalizer for FakeNormalizer {
    async fn normalize(&self, _media_ref: &str) -> ProviderResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::permanent("re-encode failed"));
        }
        Ok("media-normalized".to_string())
    }
}

struct FakeAnalyzer {
    fail: bool,
    candidates: Vec<Candidate>,
    calls: AtomicU32,
}

impl FakeAnalyzer {
    fn with_two_candidates() -> Self {
        let scores = ViralitySubScores {
            hook: 80,
            emotion: 70,
            insight: 90,
            call_to_action: 60,
            quality: 75,
        };
        Self {
            fail: false,
            candidates: vec![
                Candidate {
                    start_secs: 0.0,
                    end_secs: 30.0,
                    sub_scores: scores,
                    ai_title: "Cold open".into(),
                    ai_description: None,
                },
                Candidate {
                    start_secs: 40.0,
                    end_secs: 75.0,
                    sub_scores: ViralitySubScores {
                        hook: 95,
                        emotion: 90,
                        insight: 95,
                        call_to_action: 80,
                        quality: 90,
                    },
                    ai_title: "The big insight".into(),
                    ai_description: Some("Key moment".into()),
                },
            ],
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait]
impl ViralityAnalyzer for FakeAnalyzer {
    async fn analyze(
        &self,
        _transcript: &clipcast_models::Transcript,
        _media_ref: &str,
        _weights: Option<&clipcast_models::ScoreWeights>,
    ) -> ProviderResult<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ProviderError::permanent("model rejected request"));
        }
        Ok(self.candidates.clone())
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    coordinator: Arc<PipelineCoordinator>,
}

fn harness(
    downloader: Arc<FakeDownloader>,
    transcriber: Arc<FakeTranscriber>,
    normalizer: Option<Arc<FakeNormalizer>>,
    analyzer: Arc<FakeAnalyzer>,
) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let config = PipelineConfig {
        poll_interval: Duration::from_millis(10),
        ..PipelineConfig::default()
    };
    let coordinator = Arc::new(PipelineCoordinator::new(
        store.clone() as Arc<dyn Store>,
        downloader,
        transcriber,
        normalizer.map(|n| n as Arc<dyn MediaNormalizer>),
        analyzer,
        config,
    ));
    Harness { store, coordinator }
}

async fn upload_video(store: &MemoryStore, media_ref: &str) -> VideoId {
    let video = Video::new_upload("acme", media_ref, None);
    let id = video.id.clone();
    store.create_video(video).await.unwrap();
    id
}

async fn drive_to_terminal(h: &Harness, id: &VideoId) -> Video {
    for _ in 0..25 {
        let handles = h.coordinator.tick().await.unwrap();
        for handle in handles {
            handle.await.unwrap();
        }
        let video = h.store.get_video(id).await.unwrap().unwrap();
        if video.status.is_terminal() {
            return video;
        }
    }
    panic!("video never reached a terminal state");
}

#[tokio::test]
async fn test_upload_reaches_ready_with_ranked_clips() {
    let h = harness(
        Arc::new(FakeDownloader {
            fail: false,
            calls: AtomicU32::new(0),
        }),
        Arc::new(FakeTranscriber::ok()),
        None,
        Arc::new(FakeAnalyzer::with_two_candidates()),
    );
    let id = upload_video(&h.store, "media-raw").await;

    let video = drive_to_terminal(&h, &id).await;
    assert_eq!(video.status, VideoStatus::Ready);
    // Duration backfilled from transcription
    assert_eq!(video.duration_secs, Some(120.0));

    let clips = h.store.list_clips(&id).await.unwrap();
    assert_eq!(clips.len(), 2);
    // Highest composite first
    assert!(clips[0].virality_score > clips[1].virality_score);
    assert_eq!(clips[0].ai_title, "The big insight");
    assert!(clips.iter().all(|c| c.status == ClipStatus::PendingReview));
    assert_eq!(clips[1].transcript_excerpt, "welcome to the show");
}

#[tokio::test]
async fn test_url_import_reaches_ready() {
    let h = harness(
        Arc::new(FakeDownloader {
            fail: false,
            calls: AtomicU32::new(0),
        }),
        Arc::new(FakeTranscriber::ok()),
        None,
        Arc::new(FakeAnalyzer::with_two_candidates()),
    );
    let video = Video::new_url_import("acme", "https://example.com/talk.mp4");
    let id = video.id.clone();
    h.store.create_video(video).await.unwrap();

    let video = drive_to_terminal(&h, &id).await;
    assert_eq!(video.status, VideoStatus::Ready);
    assert_eq!(video.media_ref.as_deref(), Some("media-dl"));
}

#[tokio::test]
async fn test_download_failure_exhausts_retries() {
    let downloader = Arc::new(FakeDownloader {
        fail: true,
        calls: AtomicU32::new(0),
    });
    let h = harness(
        downloader.clone(),
        Arc::new(FakeTranscriber::ok()),
        None,
        Arc::new(FakeAnalyzer::with_two_candidates()),
    );
    let video = Video::new_url_import("acme", "https://example.com/talk.mp4");
    let id = video.id.clone();
    h.store.create_video(video).await.unwrap();

    let video = drive_to_terminal(&h, &id).await;
    assert_eq!(video.status, VideoStatus::Failed);
    assert_eq!(video.failure_reason, Some(FailureReason::DownloadError));
    // Initial attempt plus three retries
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_empty_transcript_still_reaches_ready() {
    let analyzer = Arc::new(FakeAnalyzer::with_two_candidates());
    let h = harness(
        Arc::new(FakeDownloader {
            fail: false,
            calls: AtomicU32::new(0),
        }),
        Arc::new(FakeTranscriber {
            empty: true,
            ..FakeTranscriber::ok()
        }),
        None,
        analyzer.clone(),
    );
    let id = upload_video(&h.store, "media-raw").await;

    let video = drive_to_terminal(&h, &id).await;
    assert_eq!(video.status, VideoStatus::Ready);
    assert!(h.store.list_clips(&id).await.unwrap().is_empty());
    // Empty transcripts skip the analyzer entirely
    assert_eq!(analyzer.calls.load(Ordering::SeqCst), 0);

    let transcript = h.store.get_transcript(&id).await.unwrap().unwrap();
    assert!(transcript.is_empty());
}

#[tokio::test]
async fn test_unsupported_codec_gets_one_normalization_pass() {
    let normalizer = Arc::new(FakeNormalizer {
        fail: false,
        calls: AtomicU32::new(0),
    });
    let h = harness(
        Arc::new(FakeDownloader {
            fail: false,
            calls: AtomicU32::new(0),
        }),
        Arc::new(FakeTranscriber {
            reject_refs: vec!["media-raw"],
            ..FakeTranscriber::ok()
        }),
        Some(normalizer.clone()),
        Arc::new(FakeAnalyzer::with_two_candidates()),
    );
    let id = upload_video(&h.store, "media-raw").await;

    let video = drive_to_terminal(&h, &id).await;
    assert_eq!(video.status, VideoStatus::Ready);
    assert_eq!(normalizer.calls.load(Ordering::SeqCst), 1);
    // The normalized object replaces the original reference
    assert_eq!(video.media_ref.as_deref(), Some("media-normalized"));
}

#[tokio::test]
async fn test_failed_normalization_is_invalid_media() {
    let h = harness(
        Arc::new(FakeDownloader {
            fail: false,
            calls: AtomicU32::new(0),
        }),
        Arc::new(FakeTranscriber {
            reject_refs: vec!["media-raw"],
            ..FakeTranscriber::ok()
        }),
        Some(Arc::new(FakeNormalizer {
            fail: true,
            calls: AtomicU32::new(0),
        })),
        Arc::new(FakeAnalyzer::with_two_candidates()),
    );
    let id = upload_video(&h.store, "media-raw").await;

    let video = drive_to_terminal(&h, &id).await;
    assert_eq!(video.status, VideoStatus::Failed);
    assert_eq!(video.failure_reason, Some(FailureReason::InvalidMedia));
}

#[tokio::test]
async fn test_analysis_failure_preserves_transcript() {
    let h = harness(
        Arc::new(FakeDownloader {
            fail: false,
            calls: AtomicU32::new(0),
        }),
        Arc::new(FakeTranscriber::ok()),
        None,
        Arc::new(FakeAnalyzer {
            fail: true,
            candidates: vec![],
            calls: AtomicU32::new(0),
        }),
    );
    let id = upload_video(&h.store, "media-raw").await;

    let video = drive_to_terminal(&h, &id).await;
    assert_eq!(video.status, VideoStatus::Failed);
    assert_eq!(video.failure_reason, Some(FailureReason::AnalysisError));
    // Partial progress survives the failure
    assert!(h.store.get_transcript(&id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_stuck_video_fails_with_timeout() {
    let h = harness(
        Arc::new(FakeDownloader {
            fail: false,
            calls: AtomicU32::new(0),
        }),
        Arc::new(FakeTranscriber::ok()),
        None,
        Arc::new(FakeAnalyzer::with_two_candidates()),
    );
    let mut video = Video::new_upload("acme", "media-raw", None);
    video.stage_started_at = Utc::now() - chrono::Duration::hours(1);
    let id = video.id.clone();
    h.store.create_video(video).await.unwrap();

    let handles = h.coordinator.tick().await.unwrap();
    assert!(handles.is_empty());

    let video = h.store.get_video(&id).await.unwrap().unwrap();
    assert_eq!(video.status, VideoStatus::Failed);
    assert_eq!(video.failure_reason, Some(FailureReason::Timeout));
}

#[tokio::test]
async fn test_concurrent_ticks_never_duplicate_stage_work() {
    let gate = Arc::new(Notify::new());
    let transcriber = Arc::new(FakeTranscriber {
        gate: Some(gate.clone()),
        ..FakeTranscriber::ok()
    });
    let h = harness(
        Arc::new(FakeDownloader {
            fail: false,
            calls: AtomicU32::new(0),
        }),
        transcriber.clone(),
        None,
        Arc::new(FakeAnalyzer::with_two_candidates()),
    );
    let id = upload_video(&h.store, "media-raw").await;

    let first = h.coordinator.tick().await.unwrap();
    assert_eq!(first.len(), 1);

    // The transcription task is parked on the gate; a second poll must not
    // re-trigger the same stage.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = h.coordinator.tick().await.unwrap();
    assert!(second.is_empty());

    gate.notify_one();
    for handle in first {
        handle.await.unwrap();
    }
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);

    let video = h.store.get_video(&id).await.unwrap().unwrap();
    assert_eq!(video.status, VideoStatus::Transcribed);
}

#[tokio::test]
async fn test_deletion_midflight_is_a_safe_noop() {
    let gate = Arc::new(Notify::new());
    let transcriber = Arc::new(FakeTranscriber {
        gate: Some(gate.clone()),
        ..FakeTranscriber::ok()
    });
    let h = harness(
        Arc::new(FakeDownloader {
            fail: false,
            calls: AtomicU32::new(0),
        }),
        transcriber,
        None,
        Arc::new(FakeAnalyzer::with_two_candidates()),
    );
    let id = upload_video(&h.store, "media-raw").await;

    let handles = h.coordinator.tick().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Cancel while transcription is in flight
    h.store.delete_video(&id).await.unwrap();
    gate.notify_one();
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(h.store.get_video(&id).await.unwrap().is_none());
    assert!(h.store.get_transcript(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reanalysis_protects_approved_clips() {
    let h = harness(
        Arc::new(FakeDownloader {
            fail: false,
            calls: AtomicU32::new(0),
        }),
        Arc::new(FakeTranscriber::ok()),
        None,
        Arc::new(FakeAnalyzer::with_two_candidates()),
    );
    let id = upload_video(&h.store, "media-raw").await;
    drive_to_terminal(&h, &id).await;

    let clips = h.store.list_clips(&id).await.unwrap();
    let approved_id = clips[0].id.clone();
    h.store
        .review_clip(&approved_id, ReviewDecision::Approve)
        .await
        .unwrap();

    let outcome = h.coordinator.reanalyze(&id, None).await.unwrap();
    assert_eq!(outcome.protected, 1);
    assert_eq!(outcome.removed, 1);
    assert_eq!(outcome.inserted, 2);

    let after = h.store.list_clips(&id).await.unwrap();
    assert_eq!(after.len(), 3);
    let approved = after.iter().find(|c| c.id == approved_id).unwrap();
    assert_eq!(approved.status, ClipStatus::Approved);
}
