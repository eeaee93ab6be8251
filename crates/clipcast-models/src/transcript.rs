//! Transcript models with word/segment alignment.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::video::VideoId;

/// A single word with timing offsets into the source media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Word {
    pub text: String,
    pub start_secs: f64,
    pub end_secs: f64,
}

/// A sentence-scale chunk with timing offsets into the source media.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Segment {
    pub text: String,
    pub start_secs: f64,
    pub end_secs: f64,
}

/// The aligned transcript of a video (1:1 once transcription completes).
///
/// An empty transcript (no words, no segments) is valid: silent audio is not
/// a pipeline failure.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Transcript {
    /// Video this transcript belongs to
    pub video_id: VideoId,

    /// Full transcript text
    pub full_text: String,

    /// Detected language (BCP-47 tag, e.g. "en")
    pub language: String,

    /// Media duration in seconds as reported by the transcription provider
    pub duration_secs: f64,

    /// Ordered word-level timings
    pub words: Vec<Word>,

    /// Ordered segment-level timings
    pub segments: Vec<Segment>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Transcript {
    /// Create a transcript, validating timing invariants.
    pub fn new(
        video_id: VideoId,
        full_text: impl Into<String>,
        language: impl Into<String>,
        duration_secs: f64,
        words: Vec<Word>,
        segments: Vec<Segment>,
    ) -> ModelResult<Self> {
        let transcript = Self {
            video_id,
            full_text: full_text.into(),
            language: language.into(),
            duration_secs,
            words,
            segments,
            created_at: Utc::now(),
        };
        transcript.validate()?;
        Ok(transcript)
    }

    /// An empty transcript for silent or speech-free audio.
    pub fn empty(video_id: VideoId, duration_secs: f64) -> Self {
        Self {
            video_id,
            full_text: String::new(),
            language: String::new(),
            duration_secs,
            words: Vec::new(),
            segments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.segments.is_empty()
    }

    /// Check timing invariants: each unit has `start < end`, sequences are
    /// monotonically increasing and non-overlapping, and spans fit within
    /// the reported duration.
    pub fn validate(&self) -> ModelResult<()> {
        validate_sequence("word", self.words.iter().map(|w| (w.start_secs, w.end_secs)))?;
        validate_sequence(
            "segment",
            self.segments.iter().map(|s| (s.start_secs, s.end_secs)),
        )?;

        if let Some(last) = self.segments.last() {
            if last.end_secs > self.duration_secs + 0.5 {
                return Err(ModelError::invalid_transcript(format!(
                    "segment ends at {:.2}s past duration {:.2}s",
                    last.end_secs, self.duration_secs
                )));
            }
        }
        Ok(())
    }

    /// Text of segments overlapping `[start_secs, end_secs)`, joined with
    /// spaces. Used to attach an excerpt to generated clips.
    pub fn excerpt(&self, start_secs: f64, end_secs: f64) -> String {
        self.segments
            .iter()
            .filter(|s| s.start_secs < end_secs && s.end_secs > start_secs)
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn validate_sequence(kind: &str, spans: impl Iterator<Item = (f64, f64)>) -> ModelResult<()> {
    let mut prev_end = f64::NEG_INFINITY;
    for (i, (start, end)) in spans.enumerate() {
        if start < 0.0 || start >= end {
            return Err(ModelError::invalid_transcript(format!(
                "{} {} has invalid span [{:.3}, {:.3})",
                kind, i, start, end
            )));
        }
        if start < prev_end {
            return Err(ModelError::invalid_transcript(format!(
                "{} {} starts at {:.3}s before previous end {:.3}s",
                kind, i, start, prev_end
            )));
        }
        prev_end = end;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(text: &str, start: f64, end: f64) -> Segment {
        Segment {
            text: text.to_string(),
            start_secs: start,
            end_secs: end,
        }
    }

    #[test]
    fn test_valid_transcript() {
        let t = Transcript::new(
            VideoId::new(),
            "hello world",
            "en",
            10.0,
            vec![
                Word {
                    text: "hello".into(),
                    start_secs: 0.0,
                    end_secs: 0.5,
                },
                Word {
                    text: "world".into(),
                    start_secs: 0.5,
                    end_secs: 1.0,
                },
            ],
            vec![seg("hello world", 0.0, 1.0)],
        );
        assert!(t.is_ok());
    }

    #[test]
    fn test_empty_transcript_is_valid() {
        let t = Transcript::empty(VideoId::new(), 120.0);
        assert!(t.is_empty());
        assert!(t.validate().is_ok());
    }

    #[test]
    fn test_overlapping_segments_rejected() {
        let t = Transcript::new(
            VideoId::new(),
            "a b",
            "en",
            10.0,
            vec![],
            vec![seg("a", 0.0, 2.0), seg("b", 1.5, 3.0)],
        );
        assert!(t.is_err());
    }

    #[test]
    fn test_inverted_span_rejected() {
        let t = Transcript::new(
            VideoId::new(),
            "a",
            "en",
            10.0,
            vec![],
            vec![seg("a", 2.0, 1.0)],
        );
        assert!(t.is_err());
    }

    #[test]
    fn test_segment_past_duration_rejected() {
        let t = Transcript::new(
            VideoId::new(),
            "a",
            "en",
            10.0,
            vec![],
            vec![seg("a", 9.0, 12.0)],
        );
        assert!(t.is_err());
    }

    #[test]
    fn test_excerpt_selects_overlapping_segments() {
        let t = Transcript::new(
            VideoId::new(),
            "one two three",
            "en",
            30.0,
            vec![],
            vec![
                seg("one", 0.0, 5.0),
                seg("two", 5.0, 10.0),
                seg("three", 10.0, 15.0),
            ],
        )
        .unwrap();

        assert_eq!(t.excerpt(4.0, 11.0), "one two three");
        assert_eq!(t.excerpt(5.0, 10.0), "two");
        assert_eq!(t.excerpt(20.0, 25.0), "");
    }
}
