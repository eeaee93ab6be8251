//! Pipeline coordinator: polls active videos and drives each through the
//! stage table `downloading -> processing -> transcribed -> analyzed -> ready`.
//!
//! All advancement is poll-driven. Each tick claims stage work for videos not
//! already in flight, bounded by a semaphore; a video is processed by at most
//! one task at a time, so `(video_id, stage)` work is never duplicated.
//! Stage transitions go through the store's conditional advance, so a video
//! deleted or failed mid-flight turns the in-flight work into a no-op.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use metrics::{counter, histogram};
use tokio::sync::{watch, Mutex, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use clipcast_models::{FailureReason, Transcript, Video, VideoId, VideoStatus};
use clipcast_providers::{
    retry_provider, DownloadAdapter, MediaNormalizer, ProviderError, RetryConfig,
    TranscriptionAdapter, ViralityAnalyzer,
};
use clipcast_store::{ReplaceOutcome, Store, StoreError};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::ranking::RankingPolicy;

mod metric {
    pub const STAGE_COMPLETED: &str = "clipcast_pipeline_stage_completed_total";
    pub const STAGE_FAILED: &str = "clipcast_pipeline_stage_failed_total";
    pub const STAGE_DURATION: &str = "clipcast_pipeline_stage_duration_seconds";
}

pub struct PipelineCoordinator {
    store: Arc<dyn Store>,
    downloader: Arc<dyn DownloadAdapter>,
    transcriber: Arc<dyn TranscriptionAdapter>,
    normalizer: Option<Arc<dyn MediaNormalizer>>,
    analyzer: Arc<dyn ViralityAnalyzer>,
    ranking: RankingPolicy,
    config: PipelineConfig,
    limiter: Arc<Semaphore>,
    in_flight: Mutex<HashSet<VideoId>>,
}

impl PipelineCoordinator {
    pub fn new(
        store: Arc<dyn Store>,
        downloader: Arc<dyn DownloadAdapter>,
        transcriber: Arc<dyn TranscriptionAdapter>,
        normalizer: Option<Arc<dyn MediaNormalizer>>,
        analyzer: Arc<dyn ViralityAnalyzer>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            downloader,
            transcriber,
            normalizer,
            analyzer,
            ranking: RankingPolicy {
                min_clip_secs: config.min_clip_secs,
                max_clip_secs: config.max_clip_secs,
                top_n: config.top_n,
                weights: config.weights,
            },
            limiter: Arc::new(Semaphore::new(config.max_concurrent_stages)),
            config,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Run the poll loop until shutdown is signalled.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            max_concurrent = self.config.max_concurrent_stages,
            "Pipeline coordinator started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.tick().await {
                        warn!(error = %e, "Pipeline tick failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Pipeline coordinator shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One poll pass: fail stuck videos, then spawn stage work for active
    /// videos not already in flight, up to the concurrency limit. Returns the
    /// spawned handles so callers (and tests) can await quiescence.
    pub async fn tick(self: &Arc<Self>) -> PipelineResult<Vec<JoinHandle<()>>> {
        let now = Utc::now();
        let stage_deadline = chrono::Duration::from_std(self.config.stage_timeout)
            .unwrap_or_else(|_| chrono::Duration::days(1));

        let mut handles = Vec::new();
        for video in self.store.list_active_videos().await? {
            if self.in_flight.lock().await.contains(&video.id) {
                continue;
            }

            if video.stage_elapsed(now) > stage_deadline {
                self.fail_video(
                    &video.id,
                    video.status,
                    FailureReason::Timeout,
                    format!("stage {} exceeded timeout", video.status),
                )
                .await?;
                continue;
            }

            let Ok(permit) = Arc::clone(&self.limiter).try_acquire_owned() else {
                break;
            };

            self.in_flight.lock().await.insert(video.id.clone());
            let this = Arc::clone(self);
            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let id = video.id.clone();
                this.process_stage(video).await;
                this.in_flight.lock().await.remove(&id);
            }));
        }
        Ok(handles)
    }

    /// Run one stage for one video, mapping errors to a terminal failure.
    async fn process_stage(&self, video: Video) {
        let stage = video.status;
        let id = video.id.clone();
        let started = Instant::now();

        let outcome =
            tokio::time::timeout(self.config.stage_timeout, self.run_stage(&video)).await;
        histogram!(metric::STAGE_DURATION, "stage" => stage.as_str())
            .record(started.elapsed().as_secs_f64());

        match outcome {
            Ok(Ok(())) => {
                counter!(metric::STAGE_COMPLETED, "stage" => stage.as_str()).increment(1);
                debug!(video_id = %id, stage = %stage, "Stage completed");
            }
            Ok(Err(e)) if e.is_conflict() => {
                debug!(video_id = %id, stage = %stage, error = %e, "Stage became a no-op");
            }
            Ok(Err(e)) => {
                let reason = failure_reason_for(stage, &e);
                if let Err(fail_err) = self.fail_video(&id, stage, reason, e.to_string()).await {
                    warn!(video_id = %id, error = %fail_err, "Could not record stage failure");
                }
            }
            Err(_elapsed) => {
                if let Err(fail_err) = self
                    .fail_video(
                        &id,
                        stage,
                        FailureReason::Timeout,
                        format!("stage {} exceeded timeout", stage),
                    )
                    .await
                {
                    warn!(video_id = %id, error = %fail_err, "Could not record stage timeout");
                }
            }
        }
    }

    async fn run_stage(&self, video: &Video) -> PipelineResult<()> {
        match video.status {
            VideoStatus::Downloading => self.run_download(video).await,
            VideoStatus::Processing => self.run_transcription(video).await,
            VideoStatus::Transcribed => self.run_analysis(video).await,
            VideoStatus::Analyzed => {
                self.store
                    .advance_video_stage(
                        &video.id,
                        VideoStatus::Analyzed,
                        VideoStatus::Ready,
                        None,
                        None,
                    )
                    .await?;
                info!(video_id = %video.id, "Video ready for review");
                Ok(())
            }
            VideoStatus::Ready | VideoStatus::Failed => Ok(()),
        }
    }

    async fn run_download(&self, video: &Video) -> PipelineResult<()> {
        let url = video
            .source_url
            .clone()
            .ok_or_else(|| PipelineError::validation("url import has no source_url"))?;

        self.ensure_stage(&video.id, VideoStatus::Downloading).await?;

        let retry = RetryConfig::new("download").with_max_retries(self.config.provider_retries);
        let result =
            retry_provider(&retry, || self.downloader.import_from_url(&url)).await?;

        self.store
            .advance_video_stage(
                &video.id,
                VideoStatus::Downloading,
                VideoStatus::Processing,
                Some(result.media_ref),
                result.duration_secs,
            )
            .await?;
        info!(video_id = %video.id, "Download resolved");
        Ok(())
    }

    async fn run_transcription(&self, video: &Video) -> PipelineResult<()> {
        let media_ref = video
            .media_ref
            .clone()
            .ok_or_else(|| PipelineError::validation("video has no media"))?;

        self.ensure_stage(&video.id, VideoStatus::Processing).await?;

        let retry = RetryConfig::new("transcribe").with_max_retries(self.config.provider_retries);
        let (output, final_ref) =
            match retry_provider(&retry, || self.transcriber.transcribe(&media_ref)).await {
                Ok(output) => (output, media_ref),
                Err(ProviderError::Permanent(msg)) => {
                    // One normalization pass for corrupt/unsupported media,
                    // then a fresh transcription attempt.
                    let Some(normalizer) = &self.normalizer else {
                        return Err(ProviderError::Permanent(msg).into());
                    };
                    warn!(
                        video_id = %video.id,
                        error = %msg,
                        "Transcription rejected media, attempting normalization"
                    );
                    let normalized_ref =
                        normalizer.normalize(&media_ref).await.map_err(|e| {
                            ProviderError::validation(format!(
                                "media normalization failed: {}",
                                e
                            ))
                        })?;
                    self.ensure_stage(&video.id, VideoStatus::Processing).await?;
                    let output =
                        retry_provider(&retry, || self.transcriber.transcribe(&normalized_ref))
                            .await?;
                    (output, normalized_ref)
                }
                Err(e) => return Err(e.into()),
            };

        let duration = if output.duration_secs > 0.0 {
            output.duration_secs
        } else {
            video.duration_secs.unwrap_or(0.0)
        };
        let transcript = if output.is_empty() {
            // Silent or speech-free audio is a valid outcome, not a failure.
            Transcript::empty(video.id.clone(), duration)
        } else {
            Transcript::new(
                video.id.clone(),
                output.full_text,
                output.language,
                duration,
                output.words,
                output.segments,
            )?
        };

        self.store.upsert_transcript(transcript).await?;
        let backfill = match video.duration_secs {
            None if duration > 0.0 => Some(duration),
            _ => None,
        };
        self.store
            .advance_video_stage(
                &video.id,
                VideoStatus::Processing,
                VideoStatus::Transcribed,
                Some(final_ref),
                backfill,
            )
            .await?;
        info!(video_id = %video.id, "Transcription complete");
        Ok(())
    }

    async fn run_analysis(&self, video: &Video) -> PipelineResult<()> {
        let transcript = self
            .store
            .get_transcript(&video.id)
            .await?
            .ok_or_else(|| PipelineError::validation("transcribed video has no transcript"))?;
        let media_ref = video
            .media_ref
            .clone()
            .ok_or_else(|| PipelineError::validation("video has no media"))?;

        self.ensure_stage(&video.id, VideoStatus::Transcribed).await?;

        // An empty transcript yields no candidates; the video still reaches
        // ready with zero clips.
        let candidates = if transcript.is_empty() {
            Vec::new()
        } else {
            let retry =
                RetryConfig::new("analyze").with_max_retries(self.config.provider_retries);
            retry_provider(&retry, || {
                self.analyzer
                    .analyze(&transcript, &media_ref, Some(&self.ranking.weights))
            })
            .await?
        };

        let clips = self.ranking.rank(video, &transcript, candidates);
        let clip_count = clips.len();

        let outcome = self
            .store
            .replace_analysis_clips(&video.id, clips)
            .await?;
        self.store
            .advance_video_stage(
                &video.id,
                VideoStatus::Transcribed,
                VideoStatus::Analyzed,
                None,
                None,
            )
            .await?;
        info!(
            video_id = %video.id,
            clips = clip_count,
            protected = outcome.protected,
            "Analysis complete"
        );
        Ok(())
    }

    /// Re-run analysis for a video that already completed the pipeline.
    /// Approved and scheduled clips survive untouched; pending and rejected
    /// clips are replaced by the fresh candidate set.
    pub async fn reanalyze(
        &self,
        video_id: &VideoId,
        weights: Option<clipcast_models::ScoreWeights>,
    ) -> PipelineResult<ReplaceOutcome> {
        if let Some(w) = &weights {
            w.validate()?;
        }
        let video = self
            .store
            .get_video(video_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("video {}", video_id)))?;
        if video.status != VideoStatus::Ready {
            return Err(PipelineError::validation(format!(
                "video is {}, re-analysis needs ready",
                video.status
            )));
        }
        let transcript = self
            .store
            .get_transcript(video_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("transcript for {}", video_id)))?;
        let media_ref = video
            .media_ref
            .clone()
            .ok_or_else(|| PipelineError::validation("video has no media"))?;

        let mut ranking = self.ranking.clone();
        if let Some(w) = weights {
            ranking.weights = w;
        }

        let candidates = if transcript.is_empty() {
            Vec::new()
        } else {
            let retry =
                RetryConfig::new("analyze").with_max_retries(self.config.provider_retries);
            retry_provider(&retry, || {
                self.analyzer
                    .analyze(&transcript, &media_ref, Some(&ranking.weights))
            })
            .await?
        };

        let clips = ranking.rank(&video, &transcript, candidates);
        let outcome = self.store.replace_analysis_clips(video_id, clips).await?;
        info!(
            video_id = %video_id,
            removed = outcome.removed,
            inserted = outcome.inserted,
            protected = outcome.protected,
            "Re-analysis complete"
        );
        Ok(outcome)
    }

    /// Existence and stage re-check before an external call or a persist.
    async fn ensure_stage(&self, id: &VideoId, expected: VideoStatus) -> PipelineResult<()> {
        match self.store.get_video(id).await? {
            Some(v) if v.status == expected => Ok(()),
            Some(v) => Err(StoreError::Conflict(format!(
                "video {} moved to {}",
                id, v.status
            ))
            .into()),
            None => Err(StoreError::NotFound(format!("video {}", id)).into()),
        }
    }

    async fn fail_video(
        &self,
        id: &VideoId,
        stage: VideoStatus,
        reason: FailureReason,
        message: String,
    ) -> PipelineResult<()> {
        match self.store.fail_video(id, reason, &message).await {
            Ok(()) => {
                counter!(
                    metric::STAGE_FAILED,
                    "stage" => stage.as_str(),
                    "reason" => reason.as_str()
                )
                .increment(1);
                warn!(
                    video_id = %id,
                    stage = %stage,
                    reason = %reason,
                    error = %message,
                    "Video pipeline failed"
                );
                Ok(())
            }
            // Already terminal or deleted: nothing left to record.
            Err(StoreError::Conflict(_)) | Err(StoreError::NotFound(_)) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Map a stage error to the failure reason surfaced on the video.
fn failure_reason_for(stage: VideoStatus, err: &PipelineError) -> FailureReason {
    match stage {
        VideoStatus::Downloading => FailureReason::DownloadError,
        VideoStatus::Processing => match err {
            PipelineError::Provider(ProviderError::Validation(_))
            | PipelineError::Validation(_) => FailureReason::InvalidMedia,
            _ => FailureReason::TranscriptionError,
        },
        _ => FailureReason::AnalysisError,
    }
}
