//! In-memory store implementation.
//!
//! All tables live behind one mutex, so every conditional operation
//! (stage advance, dispatch claim, review transition) is atomic. This is the
//! implementation used by tests and single-node deployments; a database
//! implementation supplies the same conditional-update semantics via its own
//! transactions.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use clipcast_models::{
    Clip, ClipId, FailureReason, Platform, PostId, PostStatus, ReviewDecision, ScheduledPost,
    SocialAccount, Transcript, Video, VideoId, VideoStatus,
};

use crate::error::{StoreError, StoreResult};
use crate::repo::{
    ClipRepository, PostFilter, PostRepository, ReplaceOutcome, SocialAccountRepository,
    TranscriptRepository, VideoRepository,
};

#[derive(Default)]
struct Tables {
    videos: HashMap<VideoId, Video>,
    transcripts: HashMap<VideoId, Transcript>,
    clips: HashMap<ClipId, Clip>,
    posts: HashMap<PostId, ScheduledPost>,
    accounts: HashMap<String, SocialAccount>,
}

/// In-memory store implementing every repository trait.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VideoRepository for MemoryStore {
    async fn create_video(&self, video: Video) -> StoreResult<()> {
        let mut tables = self.inner.lock().await;
        tables.videos.insert(video.id.clone(), video);
        Ok(())
    }

    async fn get_video(&self, id: &VideoId) -> StoreResult<Option<Video>> {
        let tables = self.inner.lock().await;
        Ok(tables.videos.get(id).cloned())
    }

    async fn list_active_videos(&self) -> StoreResult<Vec<Video>> {
        let tables = self.inner.lock().await;
        let mut active: Vec<Video> = tables
            .videos
            .values()
            .filter(|v| !v.status.is_terminal())
            .cloned()
            .collect();
        active.sort_by_key(|v| v.stage_started_at);
        Ok(active)
    }

    async fn advance_video_stage(
        &self,
        id: &VideoId,
        expected: VideoStatus,
        next: VideoStatus,
        media_ref: Option<String>,
        duration_secs: Option<f64>,
    ) -> StoreResult<Video> {
        let mut tables = self.inner.lock().await;
        let video = tables
            .videos
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("video {}", id)))?;

        if video.status != expected {
            return Err(StoreError::conflict(format!(
                "video {} is {} (expected {})",
                id, video.status, expected
            )));
        }

        video.advance_to(next)?;
        if let Some(media_ref) = media_ref {
            video.media_ref = Some(media_ref);
        }
        if let Some(duration) = duration_secs {
            video.duration_secs = Some(duration);
        }
        debug!(video_id = %id, status = %next, "Advanced video stage");
        Ok(video.clone())
    }

    async fn fail_video(
        &self,
        id: &VideoId,
        reason: FailureReason,
        message: &str,
    ) -> StoreResult<()> {
        let mut tables = self.inner.lock().await;
        let video = tables
            .videos
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("video {}", id)))?;

        if video.status.is_terminal() {
            return Err(StoreError::conflict(format!(
                "video {} already {}",
                id, video.status
            )));
        }
        video
            .fail(reason, message)
            .map_err(StoreError::Model)?;
        Ok(())
    }

    async fn delete_video(&self, id: &VideoId) -> StoreResult<()> {
        let mut tables = self.inner.lock().await;
        if tables.videos.remove(id).is_none() {
            return Err(StoreError::not_found(format!("video {}", id)));
        }
        tables.transcripts.remove(id);

        let clip_ids: Vec<ClipId> = tables
            .clips
            .values()
            .filter(|c| &c.video_id == id)
            .map(|c| c.id.clone())
            .collect();
        for clip_id in &clip_ids {
            tables.clips.remove(clip_id);
        }

        tables.posts.retain(|_, post| {
            post.clip_id
                .as_ref()
                .map(|cid| !clip_ids.contains(cid))
                .unwrap_or(true)
        });

        debug!(video_id = %id, clips = clip_ids.len(), "Deleted video with cascade");
        Ok(())
    }
}

#[async_trait]
impl TranscriptRepository for MemoryStore {
    async fn upsert_transcript(&self, transcript: Transcript) -> StoreResult<()> {
        let mut tables = self.inner.lock().await;
        if !tables.videos.contains_key(&transcript.video_id) {
            return Err(StoreError::conflict(format!(
                "video {} deleted before transcript persisted",
                transcript.video_id
            )));
        }
        tables
            .transcripts
            .insert(transcript.video_id.clone(), transcript);
        Ok(())
    }

    async fn get_transcript(&self, video_id: &VideoId) -> StoreResult<Option<Transcript>> {
        let tables = self.inner.lock().await;
        Ok(tables.transcripts.get(video_id).cloned())
    }
}

#[async_trait]
impl ClipRepository for MemoryStore {
    async fn get_clip(&self, id: &ClipId) -> StoreResult<Option<Clip>> {
        let tables = self.inner.lock().await;
        Ok(tables.clips.get(id).cloned())
    }

    async fn list_clips(&self, video_id: &VideoId) -> StoreResult<Vec<Clip>> {
        let tables = self.inner.lock().await;
        let mut clips: Vec<Clip> = tables
            .clips
            .values()
            .filter(|c| &c.video_id == video_id)
            .cloned()
            .collect();
        clips.sort_by(|a, b| b.virality_score.cmp(&a.virality_score));
        Ok(clips)
    }

    async fn replace_analysis_clips(
        &self,
        video_id: &VideoId,
        clips: Vec<Clip>,
    ) -> StoreResult<ReplaceOutcome> {
        let mut tables = self.inner.lock().await;
        if !tables.videos.contains_key(video_id) {
            return Err(StoreError::conflict(format!(
                "video {} deleted before clips persisted",
                video_id
            )));
        }

        let replaceable: Vec<ClipId> = tables
            .clips
            .values()
            .filter(|c| &c.video_id == video_id && !c.status.is_protected())
            .map(|c| c.id.clone())
            .collect();
        let protected = tables
            .clips
            .values()
            .filter(|c| &c.video_id == video_id && c.status.is_protected())
            .count();

        for id in &replaceable {
            tables.clips.remove(id);
        }
        let inserted = clips.len();
        for clip in clips {
            tables.clips.insert(clip.id.clone(), clip);
        }

        Ok(ReplaceOutcome {
            removed: replaceable.len(),
            inserted,
            protected,
        })
    }

    async fn review_clip(&self, id: &ClipId, decision: ReviewDecision) -> StoreResult<Clip> {
        let mut tables = self.inner.lock().await;
        let clip = tables
            .clips
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("clip {}", id)))?;
        clip.review(decision)?;
        Ok(clip.clone())
    }

    async fn mark_clip_scheduled(&self, id: &ClipId) -> StoreResult<Clip> {
        let mut tables = self.inner.lock().await;
        let clip = tables
            .clips
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("clip {}", id)))?;
        clip.mark_scheduled()?;
        Ok(clip.clone())
    }

    async fn delete_clip(&self, id: &ClipId) -> StoreResult<()> {
        let mut tables = self.inner.lock().await;
        if tables.clips.remove(id).is_none() {
            return Err(StoreError::not_found(format!("clip {}", id)));
        }
        // Invalidate unpublished posts that referenced the clip
        for post in tables.posts.values_mut() {
            if post.clip_id.as_ref() == Some(id) && post.status != PostStatus::Published {
                post.status = PostStatus::Failed;
                post.error_message = Some("referenced clip was deleted".to_string());
                post.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create_post(&self, post: ScheduledPost) -> StoreResult<()> {
        let mut tables = self.inner.lock().await;
        tables.posts.insert(post.id.clone(), post);
        Ok(())
    }

    async fn get_post(&self, id: &PostId) -> StoreResult<Option<ScheduledPost>> {
        let tables = self.inner.lock().await;
        Ok(tables.posts.get(id).cloned())
    }

    async fn list_posts(&self, filter: &PostFilter) -> StoreResult<Vec<ScheduledPost>> {
        let tables = self.inner.lock().await;
        let mut posts: Vec<ScheduledPost> = tables
            .posts
            .values()
            .filter(|p| {
                filter
                    .company_id
                    .as_ref()
                    .map(|c| &p.company_id == c)
                    .unwrap_or(true)
                    && filter.status.map(|s| p.status == s).unwrap_or(true)
                    && filter
                        .approval_status
                        .map(|s| p.approval_status == s)
                        .unwrap_or(true)
            })
            .cloned()
            .collect();
        posts.sort_by_key(|p| p.scheduled_for);
        Ok(posts)
    }

    async fn approve_post(&self, id: &PostId) -> StoreResult<ScheduledPost> {
        let mut tables = self.inner.lock().await;
        let post = tables
            .posts
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(format!("post {}", id)))?;
        post.approve()?;
        Ok(post.clone())
    }

    async fn claim_due_posts(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> StoreResult<Vec<ScheduledPost>> {
        let mut tables = self.inner.lock().await;
        let mut due_ids: Vec<(DateTime<Utc>, PostId)> = tables
            .posts
            .values()
            .filter(|p| p.is_due(now))
            .map(|p| (p.scheduled_for, p.id.clone()))
            .collect();
        due_ids.sort_by_key(|(scheduled_for, _)| *scheduled_for);

        let mut claimed = Vec::new();
        for (_, id) in due_ids.into_iter().take(limit) {
            if let Some(post) = tables.posts.get_mut(&id) {
                post.status = PostStatus::Publishing;
                post.updated_at = now;
                claimed.push(post.clone());
            }
        }
        if !claimed.is_empty() {
            debug!(count = claimed.len(), "Claimed due posts for dispatch");
        }
        Ok(claimed)
    }

    async fn save_dispatch_outcome(&self, post: ScheduledPost) -> StoreResult<()> {
        let mut tables = self.inner.lock().await;
        let stored = tables
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| StoreError::not_found(format!("post {}", post.id)))?;
        if stored.status != PostStatus::Publishing {
            return Err(StoreError::conflict(format!(
                "post {} is {} (expected publishing)",
                post.id, stored.status
            )));
        }
        *stored = post;
        Ok(())
    }
}

#[async_trait]
impl SocialAccountRepository for MemoryStore {
    async fn upsert_account(&self, account: SocialAccount) -> StoreResult<()> {
        let mut tables = self.inner.lock().await;
        tables.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    async fn find_connected_account(
        &self,
        company_id: &str,
        platform: Platform,
    ) -> StoreResult<Option<SocialAccount>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .accounts
            .values()
            .find(|a| a.company_id == company_id && a.platform == platform && a.is_connected())
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use clipcast_models::{ApprovalStatus, ClipStatus, PostContent, ViralitySubScores};

    fn clip_for(video_id: &VideoId, status: ClipStatus, start: f64) -> Clip {
        let now = Utc::now();
        Clip {
            id: ClipId::new(),
            video_id: video_id.clone(),
            company_id: "acme".into(),
            start_secs: start,
            end_secs: start + 30.0,
            virality_score: 70,
            sub_scores: ViralitySubScores::default(),
            aspect_ratio: Default::default(),
            caption_style: Default::default(),
            ai_title: "clip".into(),
            ai_description: None,
            transcript_excerpt: String::new(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    fn due_post(clip_id: Option<ClipId>, offset_mins: i64) -> ScheduledPost {
        let mut post = ScheduledPost::new(
            "acme",
            clip_id,
            vec![Platform::Tiktok],
            PostContent::default(),
            None,
            Utc::now() + Duration::minutes(offset_mins),
            ApprovalStatus::Approved,
        );
        post.status = PostStatus::Scheduled;
        post
    }

    #[tokio::test]
    async fn test_stage_advance_is_conditional() {
        let store = MemoryStore::new();
        let video = Video::new_url_import("acme", "https://example.com/v.mp4");
        let id = video.id.clone();
        store.create_video(video).await.unwrap();

        store
            .advance_video_stage(
                &id,
                VideoStatus::Downloading,
                VideoStatus::Processing,
                Some("media/1".into()),
                Some(600.0),
            )
            .await
            .unwrap();

        // A stale poller still expecting `downloading` conflicts
        let err = store
            .advance_video_stage(
                &id,
                VideoStatus::Downloading,
                VideoStatus::Processing,
                None,
                None,
            )
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_delete_video_cascades() {
        let store = MemoryStore::new();
        let video = Video::new_upload("acme", "media/1", Some(600.0));
        let vid = video.id.clone();
        store.create_video(video).await.unwrap();

        store
            .upsert_transcript(Transcript::empty(vid.clone(), 600.0))
            .await
            .unwrap();

        let clip = clip_for(&vid, ClipStatus::Approved, 10.0);
        let clip_id = clip.id.clone();
        store
            .replace_analysis_clips(&vid, vec![clip])
            .await
            .unwrap();

        let post = due_post(Some(clip_id.clone()), -1);
        let post_id = post.id.clone();
        store.create_post(post).await.unwrap();

        store.delete_video(&vid).await.unwrap();

        assert!(store.get_transcript(&vid).await.unwrap().is_none());
        assert!(store.get_clip(&clip_id).await.unwrap().is_none());
        assert!(store.get_post(&post_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_keeps_protected_clips() {
        let store = MemoryStore::new();
        let video = Video::new_upload("acme", "media/1", Some(600.0));
        let vid = video.id.clone();
        store.create_video(video).await.unwrap();

        let approved = clip_for(&vid, ClipStatus::Approved, 0.0);
        let approved_id = approved.id.clone();
        let pending = clip_for(&vid, ClipStatus::PendingReview, 60.0);
        let rejected = clip_for(&vid, ClipStatus::Rejected, 120.0);
        store
            .replace_analysis_clips(&vid, vec![approved, pending, rejected])
            .await
            .unwrap();
        let fresh = clip_for(&vid, ClipStatus::PendingReview, 200.0);
        let fresh_id = fresh.id.clone();
        let outcome = store
            .replace_analysis_clips(&vid, vec![fresh])
            .await
            .unwrap();

        assert_eq!(outcome.removed, 2);
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.protected, 1);

        let remaining = store.list_clips(&vid).await.unwrap();
        let ids: Vec<&ClipId> = remaining.iter().map(|c| &c.id).collect();
        assert!(ids.contains(&&approved_id));
        assert!(ids.contains(&&fresh_id));
        assert_eq!(remaining.len(), 2);
    }

    #[tokio::test]
    async fn test_replace_after_video_delete_conflicts() {
        let store = MemoryStore::new();
        let video = Video::new_upload("acme", "media/1", Some(600.0));
        let vid = video.id.clone();
        store.create_video(video).await.unwrap();
        store.delete_video(&vid).await.unwrap();

        let err = store
            .replace_analysis_clips(&vid, vec![clip_for(&vid, ClipStatus::PendingReview, 0.0)])
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_claim_is_exclusive_under_concurrency() {
        let store = MemoryStore::new();
        for _ in 0..10 {
            store.create_post(due_post(None, -5)).await.unwrap();
        }

        let now = Utc::now();
        let (a, b) = tokio::join!(
            store.claim_due_posts(now, 100),
            store.claim_due_posts(now, 100)
        );
        let a = a.unwrap();
        let b = b.unwrap();

        assert_eq!(a.len() + b.len(), 10);
        for post in &a {
            assert!(!b.iter().any(|p| p.id == post.id), "post claimed twice");
        }
    }

    #[tokio::test]
    async fn test_unapproved_or_future_posts_not_claimed() {
        let store = MemoryStore::new();
        let mut pending = due_post(None, -5);
        pending.approval_status = ApprovalStatus::Pending;
        store.create_post(pending).await.unwrap();
        store.create_post(due_post(None, 5)).await.unwrap();

        let claimed = store.claim_due_posts(Utc::now(), 100).await.unwrap();
        assert!(claimed.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_outcome_requires_claimed_row() {
        let store = MemoryStore::new();
        let post = due_post(None, -5);
        store.create_post(post.clone()).await.unwrap();

        // Not claimed yet: saving an outcome conflicts
        let mut outcome = post.clone();
        outcome.status = PostStatus::Published;
        assert!(store.save_dispatch_outcome(outcome).await.unwrap_err().is_conflict());

        let claimed = store.claim_due_posts(Utc::now(), 1).await.unwrap();
        let mut done = claimed.into_iter().next().unwrap();
        done.status = PostStatus::Published;
        done.posted_at = Some(Utc::now());
        store.save_dispatch_outcome(done).await.unwrap();

        let stored = store.get_post(&post.id).await.unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Published);
    }

    #[tokio::test]
    async fn test_delete_clip_invalidates_unpublished_posts() {
        let store = MemoryStore::new();
        let video = Video::new_upload("acme", "media/1", Some(600.0));
        let vid = video.id.clone();
        store.create_video(video).await.unwrap();

        let clip = clip_for(&vid, ClipStatus::Scheduled, 0.0);
        let clip_id = clip.id.clone();
        store
            .replace_analysis_clips(&vid, vec![clip])
            .await
            .unwrap();

        let post = due_post(Some(clip_id.clone()), 10);
        let post_id = post.id.clone();
        store.create_post(post).await.unwrap();

        store.delete_clip(&clip_id).await.unwrap();

        let stored = store.get_post(&post_id).await.unwrap().unwrap();
        assert_eq!(stored.status, PostStatus::Failed);
        assert!(stored.error_message.unwrap().contains("deleted"));
    }
}
