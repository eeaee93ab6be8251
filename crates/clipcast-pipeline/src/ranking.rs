//! Candidate ranking: window bounds, composite scoring, overlap de-dup.

use chrono::Utc;
use tracing::debug;

use clipcast_models::{
    AspectRatio, CaptionStyle, Clip, ClipId, ClipStatus, ScoreWeights, Transcript, Video,
    ViralitySubScores,
};
use clipcast_providers::Candidate;

/// How analyzer candidates become persisted clips.
#[derive(Debug, Clone)]
pub struct RankingPolicy {
    pub min_clip_secs: f64,
    pub max_clip_secs: f64,
    pub top_n: usize,
    pub weights: ScoreWeights,
}

/// Tolerance for candidate windows that slightly overrun the reported media
/// duration (provider timing jitter).
const DURATION_SLACK_SECS: f64 = 0.5;

impl RankingPolicy {
    /// Turn raw analyzer candidates into the top-N non-overlapping clips,
    /// highest composite score first.
    ///
    /// Out-of-range windows are discarded. Overlap de-dup is greedy by
    /// composite score with ties broken by earlier start, so two candidates
    /// over the same moment never both survive.
    pub fn rank(
        &self,
        video: &Video,
        transcript: &Transcript,
        candidates: Vec<Candidate>,
    ) -> Vec<Clip> {
        let duration_limit = video.duration_secs.unwrap_or(transcript.duration_secs);

        let mut scored: Vec<(u8, Candidate)> = candidates
            .into_iter()
            .filter(|c| {
                let span = c.end_secs - c.start_secs;
                let in_bounds = c.start_secs >= 0.0
                    && c.start_secs < c.end_secs
                    && span >= self.min_clip_secs
                    && span <= self.max_clip_secs
                    && (duration_limit <= 0.0
                        || c.end_secs <= duration_limit + DURATION_SLACK_SECS);
                if !in_bounds {
                    debug!(
                        video_id = %video.id,
                        start_secs = c.start_secs,
                        end_secs = c.end_secs,
                        "Discarding out-of-range candidate window"
                    );
                }
                in_bounds
            })
            .map(|mut c| {
                // The slack only buys acceptance; the stored window never
                // extends past the media itself.
                if duration_limit > 0.0 {
                    c.end_secs = c.end_secs.min(duration_limit);
                }
                c.sub_scores = clamp_sub_scores(c.sub_scores);
                (self.weights.composite(&c.sub_scores), c)
            })
            .collect();

        scored.sort_by(|(sa, a), (sb, b)| {
            sb.cmp(sa)
                .then_with(|| a.start_secs.total_cmp(&b.start_secs))
        });

        let mut selected: Vec<(u8, Candidate)> = Vec::new();
        for (score, candidate) in scored {
            if selected.len() >= self.top_n {
                break;
            }
            let overlaps = selected
                .iter()
                .any(|(_, s)| s.start_secs < candidate.end_secs && s.end_secs > candidate.start_secs);
            if !overlaps {
                selected.push((score, candidate));
            }
        }

        let now = Utc::now();
        selected
            .into_iter()
            .map(|(score, c)| Clip {
                id: ClipId::new(),
                video_id: video.id.clone(),
                company_id: video.company_id.clone(),
                start_secs: c.start_secs,
                end_secs: c.end_secs,
                virality_score: score,
                sub_scores: c.sub_scores,
                aspect_ratio: AspectRatio::default(),
                caption_style: CaptionStyle::default(),
                ai_title: c.ai_title,
                ai_description: c.ai_description,
                transcript_excerpt: transcript.excerpt(c.start_secs, c.end_secs),
                status: ClipStatus::PendingReview,
                created_at: now,
                updated_at: now,
            })
            .collect()
    }
}

fn clamp_sub_scores(s: ViralitySubScores) -> ViralitySubScores {
    ViralitySubScores {
        hook: s.hook.min(100),
        emotion: s.emotion.min(100),
        insight: s.insight.min(100),
        call_to_action: s.call_to_action.min(100),
        quality: s.quality.min(100),
    }
}
