//! Folding evaluator results into a rating.

use super::rating::{MetricResult, NOT_COMPUTED, Rating, RatingSummary, ScoreValue};
use crate::evaluators::{Evaluator, MetricName, Score};
use crate::sources::Artifact;
use chrono::{DateTime, Utc};
use core::time::Duration;
use std::collections::BTreeMap;
use strum::IntoEnumIterator;

/// Contribution of each metric to the net score, in percent.
pub const WEIGHTS: [(MetricName, u32); 7] = [
    (MetricName::License, 30),
    (MetricName::RampUpTime, 20),
    (MetricName::DatasetAndCodeScore, 15),
    (MetricName::PerformanceClaims, 10),
    (MetricName::BusFactor, 15),
    (MetricName::CodeQuality, 5),
    (MetricName::DatasetQuality, 5),
];

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// The weighted sum of the results, clamped to [0, 1] and rounded to two decimals.
///
/// Metrics that are missing or not applicable count as zero.
#[must_use]
pub fn net_score(results: &[MetricResult]) -> f64 {
    let sum: f64 = WEIGHTS
        .iter()
        .map(|(name, percent)| {
            let value = results.iter().find(|r| r.name == *name).map_or(0.0, |r| r.score.weight_value());
            f64::from(*percent) / 100.0 * value
        })
        .sum();

    round2(sum.clamp(0.0, 1.0))
}

fn missing_score(name: MetricName) -> Score {
    Evaluator::ALL
        .iter()
        .find(|e| e.metric() == name)
        .map_or(Score::NotApplicable, |e| e.default_score())
}

/// Assemble the rating for `artifact`.
///
/// Pure: the same results and timestamps always give the same rating.
#[must_use]
pub fn aggregate(artifact: &Artifact, results: &[MetricResult], total_elapsed: Duration, generated_at: DateTime<Utc>) -> Rating {
    let mut scores = BTreeMap::new();
    let mut latencies = BTreeMap::new();

    for name in MetricName::iter().filter(|n| *n != MetricName::NetScore) {
        let (score, latency) = if MetricName::STUBS.contains(&name) {
            (ScoreValue::Scalar(NOT_COMPUTED), 0)
        } else {
            results.iter().find(|r| r.name == name).map_or_else(
                || (ScoreValue::from(missing_score(name)), 0),
                |r| (ScoreValue::from(r.score), duration_ms(r.latency)),
            )
        };

        let key: &'static str = name.into();
        let _ = scores.insert(key.to_string(), score);
        let _ = latencies.insert(key.to_string(), latency);
    }

    let net_key: &'static str = MetricName::NetScore.into();
    let _ = scores.insert(net_key.to_string(), ScoreValue::Scalar(net_score(results)));
    let _ = latencies.insert(net_key.to_string(), duration_ms(total_elapsed));

    Rating::new(
        artifact.id().to_string(),
        generated_at,
        scores,
        latencies,
        RatingSummary {
            category: artifact.category(),
            name: artifact.name().to_string(),
            model_link: artifact.entry().model_url().to_string(),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluators::SizeScore;
    use crate::sources::Entry;

    fn result(name: MetricName, value: f64) -> MetricResult {
        MetricResult::computed(name, Score::Value(value), Duration::from_millis(10))
    }

    fn artifact() -> Artifact {
        Artifact::from_entry(Entry::new(None, None, "https://huggingface.co/google/gemma-2b").unwrap())
    }

    #[test]
    fn test_weights_sum_to_exactly_one_hundred() {
        assert_eq!(WEIGHTS.iter().map(|(_, w)| w).sum::<u32>(), 100);
    }

    #[test]
    fn test_all_ones_give_one() {
        let results: Vec<_> = WEIGHTS.iter().map(|(name, _)| result(*name, 1.0)).collect();
        assert!((net_score(&results) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_and_not_applicable_count_as_zero() {
        let results = vec![
            result(MetricName::License, 1.0),
            MetricResult::computed(MetricName::DatasetQuality, Score::NotApplicable, Duration::ZERO),
        ];
        assert!((net_score(&results) - 0.3).abs() < f64::EPSILON);
        assert!(net_score(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rounding() {
        let results = vec![result(MetricName::License, 0.333), result(MetricName::RampUpTime, 0.777)];
        // 0.0999 + 0.1554 = 0.2553
        assert!((net_score(&results) - 0.26).abs() < f64::EPSILON);
    }

    #[test]
    fn test_aggregate_fills_every_key() {
        let results = vec![
            result(MetricName::License, 1.0),
            MetricResult::computed(MetricName::SizeScore, Score::Devices(SizeScore::from_bytes(10)), Duration::from_millis(3)),
        ];

        let now = Utc::now();
        let rating = aggregate(&artifact(), &results, Duration::from_millis(1234), now);

        for name in MetricName::iter() {
            assert!(rating.score(name).is_some(), "missing score for {name}");
            assert!(rating.latency_ms(name).is_some(), "missing latency for {name}");
        }

        assert_eq!(rating.id(), "google/gemma-2b");
        assert_eq!(rating.generated_at(), now);
        assert_eq!(rating.summary().name, "gemma-2b");
        assert_eq!(rating.net_score(), Some(0.3));
        assert_eq!(rating.latency_ms(MetricName::NetScore), Some(1234));
        assert_eq!(rating.latency_ms(MetricName::License), Some(10));
        assert_eq!(rating.latency_ms(MetricName::BusFactor), Some(0));
        assert_eq!(rating.score(MetricName::BusFactor), Some(ScoreValue::Scalar(0.0)));
        assert_eq!(rating.score(MetricName::DatasetQuality), Some(ScoreValue::Scalar(NOT_COMPUTED)));
        assert_eq!(rating.score(MetricName::TreeScore), Some(ScoreValue::Scalar(NOT_COMPUTED)));
        assert_eq!(rating.latency_ms(MetricName::Reviewedness), Some(0));
        assert!(matches!(rating.score(MetricName::SizeScore), Some(ScoreValue::Devices(_))));
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let results = vec![result(MetricName::BusFactor, 0.5), result(MetricName::CodeQuality, 0.8)];
        let now = Utc::now();
        let a = aggregate(&artifact(), &results, Duration::from_millis(5), now);
        let b = aggregate(&artifact(), &results, Duration::from_millis(5), now);
        assert_eq!(a, b);
    }
}
