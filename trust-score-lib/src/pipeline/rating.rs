use crate::evaluators::{MetricName, Score, SizeScore};
use crate::sources::ArtifactCategory;
use chrono::{DateTime, Utc};
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stored in place of a score that was not computed because it does not apply.
pub const NOT_COMPUTED: f64 = -1.0;

/// A reported score: a scalar in [0, 1] (or [`NOT_COMPUTED`]), or per-device fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Scalar(f64),
    Devices(SizeScore),
}

impl ScoreValue {
    /// The scalar value, if this is one.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<f64> {
        match self {
            Self::Scalar(v) => Some(*v),
            Self::Devices(_) => None,
        }
    }
}

impl From<Score> for ScoreValue {
    fn from(score: Score) -> Self {
        match score {
            Score::Value(v) => Self::Scalar(v),
            Score::Devices(d) => Self::Devices(d),
            Score::NotApplicable => Self::Scalar(NOT_COMPUTED),
        }
    }
}

/// How an evaluator's score came about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Computed,

    /// The evaluator failed and a fallback score was substituted.
    Defaulted(String),
}

/// One evaluator's contribution to a rating.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricResult {
    pub name: MetricName,
    pub score: Score,
    pub latency: Duration,
    pub outcome: Outcome,
}

impl MetricResult {
    #[must_use]
    pub const fn computed(name: MetricName, score: Score, latency: Duration) -> Self {
        Self {
            name,
            score,
            latency,
            outcome: Outcome::Computed,
        }
    }

    #[must_use]
    pub const fn defaulted(name: MetricName, score: Score, latency: Duration, reason: String) -> Self {
        Self {
            name,
            score,
            latency,
            outcome: Outcome::Defaulted(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub category: ArtifactCategory,
    pub name: String,
    pub model_link: String,
}

/// The immutable result of scoring one artifact.
///
/// Every score key has a matching latency entry, in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    id: String,
    generated_at: DateTime<Utc>,
    scores: BTreeMap<String, ScoreValue>,
    latencies: BTreeMap<String, u64>,
    summary: RatingSummary,
}

impl Rating {
    #[must_use]
    pub const fn new(
        id: String,
        generated_at: DateTime<Utc>,
        scores: BTreeMap<String, ScoreValue>,
        latencies: BTreeMap<String, u64>,
        summary: RatingSummary,
    ) -> Self {
        Self {
            id,
            generated_at,
            scores,
            latencies,
            summary,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    #[must_use]
    pub const fn scores(&self) -> &BTreeMap<String, ScoreValue> {
        &self.scores
    }

    #[must_use]
    pub const fn latencies(&self) -> &BTreeMap<String, u64> {
        &self.latencies
    }

    #[must_use]
    pub const fn summary(&self) -> &RatingSummary {
        &self.summary
    }

    #[must_use]
    pub fn score(&self, name: MetricName) -> Option<ScoreValue> {
        let key: &str = name.into();
        self.scores.get(key).copied()
    }

    #[must_use]
    pub fn latency_ms(&self, name: MetricName) -> Option<u64> {
        let key: &str = name.into();
        self.latencies.get(key).copied()
    }

    /// The composite score, or `None` for a rating that lacks one.
    #[must_use]
    pub fn net_score(&self) -> Option<f64> {
        self.score(MetricName::NetScore).and_then(|s| s.as_scalar())
    }

    /// The flat form written to consumers.
    #[must_use]
    pub fn to_record(&self) -> RatingRecord {
        let mut fields = BTreeMap::new();
        for (name, value) in &self.scores {
            let latency_ms = self.latencies.get(name).copied().unwrap_or(0);
            let _ = fields.insert(name.clone(), serde_json::json!(value));
            let _ = fields.insert(format!("{name}_latency"), serde_json::json!(millis_to_seconds(latency_ms)));
        }

        RatingRecord {
            name: self.summary.name.clone(),
            category: self.summary.category,
            model_link: self.summary.model_link.clone(),
            id: self.id.clone(),
            generated_at: self.generated_at,
            fields,
            trust_score: self.net_score().unwrap_or(0.0),
            last_rated: self.generated_at,
            metrics: self.scores.clone(),
        }
    }
}

#[expect(clippy::cast_precision_loss, reason = "latencies are far below 2^52 milliseconds")]
fn millis_to_seconds(ms: u64) -> f64 {
    ms as f64 / 1000.0
}

/// One output line: the rating flattened, with each latency in seconds next to its score.
///
/// `trust_score`, `last_rated`, and `metrics` repeat `net_score`, `generated_at`, and the
/// score map for consumers that still read the older field names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingRecord {
    pub name: String,
    pub category: ArtifactCategory,
    pub model_link: String,
    pub id: String,
    pub generated_at: DateTime<Utc>,

    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,

    pub trust_score: f64,
    pub last_rated: DateTime<Utc>,
    pub metrics: BTreeMap<String, ScoreValue>,
}
