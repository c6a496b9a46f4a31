//! Turning an entry into a rating.
//!
//! [`TrustScorer`] is the entry point: it checks the [`RatingCache`] and, on a miss, has the
//! [`Orchestrator`] clone the primary repository once, fan out to every evaluator, and fold
//! the results into a [`Rating`].

mod aggregator;
mod orchestrator;
mod rating;
mod scoring_error;

pub use aggregator::{WEIGHTS, aggregate, net_score};
pub use orchestrator::{Orchestrator, PipelineSettings};
pub use rating::{MetricResult, NOT_COMPUTED, Outcome, Rating, RatingRecord, RatingSummary, ScoreValue};
pub use scoring_error::ScoringError;

use crate::cache::RatingCache;
use crate::sources::{Artifact, Entry};
use chrono::{DateTime, Utc};

const LOG_TARGET: &str = "  pipeline";

/// Rates entries, reusing recent ratings.
#[derive(Debug)]
pub struct TrustScorer {
    orchestrator: Orchestrator,
    cache: RatingCache,
}

impl TrustScorer {
    #[must_use]
    pub const fn new(orchestrator: Orchestrator, cache: RatingCache) -> Self {
        Self { orchestrator, cache }
    }

    /// Rate one entry as of now.
    pub async fn score(&self, entry: Entry) -> Result<Rating, ScoringError> {
        let artifact = Artifact::from_entry(entry);
        self.rate(&artifact, Utc::now()).await
    }

    /// Rate `artifact` as of `now`, serving a fresh stored rating when there is one.
    pub async fn rate(&self, artifact: &Artifact, now: DateTime<Utc>) -> Result<Rating, ScoringError> {
        self.cache
            .get_or_compute(artifact, now, || self.orchestrator.score(artifact, now))
            .await
    }
}
