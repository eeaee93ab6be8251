//! Virality analyzer contract.

use async_trait::async_trait;

use clipcast_models::{ScoreWeights, Transcript, ViralitySubScores};

use crate::error::ProviderResult;

/// A candidate clip window proposed by the analyzer. Candidates may overlap;
/// the pipeline's ranking pass de-duplicates them.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub start_secs: f64,
    pub end_secs: f64,
    pub sub_scores: ViralitySubScores,
    pub ai_title: String,
    pub ai_description: Option<String>,
}

/// Transcript + media -> ranked candidate clip windows with sub-scores.
///
/// A transcript with no strong material legitimately yields zero candidates;
/// that is not an error.
#[async_trait]
pub trait ViralityAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        transcript: &Transcript,
        media_ref: &str,
        weights: Option<&ScoreWeights>,
    ) -> ProviderResult<Vec<Candidate>>;
}
