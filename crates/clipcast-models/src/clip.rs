//! Clip models and virality scoring.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};
use crate::video::VideoId;

/// Unique identifier for a clip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClipId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClipId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Review/scheduling status of a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClipStatus {
    /// Waiting on a human reviewer
    #[default]
    PendingReview,
    /// Approved by a reviewer, eligible for scheduling
    Approved,
    /// Rejected by a reviewer (terminal)
    Rejected,
    /// Referenced by a scheduled post
    Scheduled,
}

impl ClipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipStatus::PendingReview => "pending_review",
            ClipStatus::Approved => "approved",
            ClipStatus::Rejected => "rejected",
            ClipStatus::Scheduled => "scheduled",
        }
    }

    /// Protected clips survive analysis re-runs untouched.
    pub fn is_protected(&self) -> bool {
        matches!(self, ClipStatus::Approved | ClipStatus::Scheduled)
    }
}

impl fmt::Display for ClipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reviewer decision on a pending clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// The five fixed virality dimensions, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct ViralitySubScores {
    /// Attention capture within the first 3 seconds
    pub hook: u8,
    /// Emotional resonance
    pub emotion: u8,
    /// Insight / informational value
    pub insight: u8,
    /// Call-to-action presence
    pub call_to_action: u8,
    /// Production quality
    pub quality: u8,
}

impl ViralitySubScores {
    pub fn new(hook: u8, emotion: u8, insight: u8, call_to_action: u8, quality: u8) -> ModelResult<Self> {
        let scores = Self {
            hook,
            emotion,
            insight,
            call_to_action,
            quality,
        };
        scores.validate()?;
        Ok(scores)
    }

    pub fn validate(&self) -> ModelResult<()> {
        for (name, value) in [
            ("hook", self.hook),
            ("emotion", self.emotion),
            ("insight", self.insight),
            ("call_to_action", self.call_to_action),
            ("quality", self.quality),
        ] {
            if value > 100 {
                return Err(ModelError::out_of_range(format!(
                    "sub-score {} is {} (max 100)",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Weights for the composite virality score. Must sum to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreWeights {
    pub hook: f64,
    pub emotion: f64,
    pub insight: f64,
    pub call_to_action: f64,
    pub quality: f64,
}

impl Default for ScoreWeights {
    /// Equal weighting across all five dimensions.
    fn default() -> Self {
        Self {
            hook: 0.2,
            emotion: 0.2,
            insight: 0.2,
            call_to_action: 0.2,
            quality: 0.2,
        }
    }
}

impl ScoreWeights {
    const SUM_TOLERANCE: f64 = 1e-6;

    pub fn validate(&self) -> ModelResult<()> {
        let parts = [
            self.hook,
            self.emotion,
            self.insight,
            self.call_to_action,
            self.quality,
        ];
        if parts.iter().any(|w| *w < 0.0) {
            return Err(ModelError::invalid_weights("weights must be non-negative"));
        }
        let sum: f64 = parts.iter().sum();
        if (sum - 1.0).abs() > Self::SUM_TOLERANCE {
            return Err(ModelError::invalid_weights(format!(
                "weights sum to {:.6}, expected 1",
                sum
            )));
        }
        Ok(())
    }

    /// Composite score: `round(Σ weight · subscore)`, clamped to 0-100.
    pub fn composite(&self, scores: &ViralitySubScores) -> u8 {
        let weighted = self.hook * scores.hook as f64
            + self.emotion * scores.emotion as f64
            + self.insight * scores.insight as f64
            + self.call_to_action * scores.call_to_action as f64
            + self.quality * scores.quality as f64;
        weighted.round().clamp(0.0, 100.0) as u8
    }
}

/// Output aspect ratio for a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    /// 9:16 vertical short-form
    #[default]
    Portrait,
    /// 16:9 horizontal
    Landscape,
    /// 1:1 square
    Square,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Square => "1:1",
        }
    }
}

/// Caption rendering style for a clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CaptionStyle {
    #[default]
    None,
    Subtitle,
    Karaoke,
    Bold,
}

/// A bounded time-window of a source video proposed as an independently
/// publishable short-form asset.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Clip {
    /// Unique clip ID
    pub id: ClipId,

    /// Video this clip belongs to
    pub video_id: VideoId,

    /// Owning company (tenant)
    pub company_id: String,

    /// Window start in seconds
    pub start_secs: f64,

    /// Window end in seconds
    pub end_secs: f64,

    /// Composite virality score (0-100)
    pub virality_score: u8,

    /// Sub-scores behind the composite
    pub sub_scores: ViralitySubScores,

    /// Output aspect ratio
    #[serde(default)]
    pub aspect_ratio: AspectRatio,

    /// Caption style
    #[serde(default)]
    pub caption_style: CaptionStyle,

    /// AI-suggested title
    pub ai_title: String,

    /// AI-suggested description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_description: Option<String>,

    /// Transcript excerpt for the window
    #[serde(default)]
    pub transcript_excerpt: String,

    /// Review/scheduling status
    #[serde(default)]
    pub status: ClipStatus,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Clip {
    /// Duration of the clip window in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Whether this clip's window overlaps `[start, end)`.
    pub fn overlaps(&self, start_secs: f64, end_secs: f64) -> bool {
        self.start_secs < end_secs && self.end_secs > start_secs
    }

    /// Apply a reviewer decision. Only pending clips can be reviewed.
    pub fn review(&mut self, decision: ReviewDecision) -> ModelResult<()> {
        if self.status != ClipStatus::PendingReview {
            let to = match decision {
                ReviewDecision::Approve => ClipStatus::Approved,
                ReviewDecision::Reject => ClipStatus::Rejected,
            };
            return Err(ModelError::invalid_transition(
                self.status.as_str(),
                to.as_str(),
            ));
        }
        self.status = match decision {
            ReviewDecision::Approve => ClipStatus::Approved,
            ReviewDecision::Reject => ClipStatus::Rejected,
        };
        self.updated_at = Utc::now();
        Ok(())
    }

    /// System transition when a scheduled post is created for this clip.
    pub fn mark_scheduled(&mut self) -> ModelResult<()> {
        if self.status != ClipStatus::Approved {
            return Err(ModelError::invalid_transition(
                self.status.as_str(),
                ClipStatus::Scheduled.as_str(),
            ));
        }
        self.status = ClipStatus::Scheduled;
        self.updated_at = Utc::now();
        Ok(())
    }
}
