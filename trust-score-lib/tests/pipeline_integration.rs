//! End-to-end ratings against fixture repositories and fake services

mod common;

use chrono::Utc;
use common::{CannedLlm, FixtureGit, TINY_PROJECT, orchestrator, scorer};
use core::time::Duration;
use std::sync::Arc;
use strum::IntoEnumIterator;
use trust_score_lib::evaluators::MetricName;
use trust_score_lib::pipeline::{NOT_COMPUTED, PipelineSettings, ScoreValue};
use trust_score_lib::sources::{Artifact, Entry};
use trust_score_lib::{Rating, ScoringError};

const CODE_URL: &str = "https://github.com/example/tiny";
const MODEL_URL: &str = "https://huggingface.co/example/tiny-model";

fn entry() -> Entry {
    Entry::new(Some(CODE_URL), None, MODEL_URL).unwrap()
}

fn scalar(rating: &Rating, name: MetricName) -> f64 {
    rating.score(name).and_then(|s| s.as_scalar()).unwrap()
}

fn assert_complete(rating: &Rating) {
    for name in MetricName::iter() {
        assert!(rating.score(name).is_some(), "missing score for {name}");
        assert!(rating.latency_ms(name).is_some(), "missing latency for {name}");
    }

    let net = rating.net_score().unwrap();
    assert!((0.0..=1.0).contains(&net), "net score {net} out of range");
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
async fn test_tiny_project_end_to_end() {
    let git = Arc::new(FixtureGit::new(TINY_PROJECT));
    let rating = scorer(&git).score(entry()).await.unwrap();

    assert_complete(&rating);
    assert_eq!(git.calls(), 1);

    assert!((scalar(&rating, MetricName::License) - 1.0).abs() < 1e-9);
    assert!(scalar(&rating, MetricName::CodeQuality) > 0.0);
    assert!((scalar(&rating, MetricName::DatasetAndCodeScore) - 0.4).abs() < 1e-9);

    let Some(ScoreValue::Devices(size)) = rating.score(MetricName::SizeScore) else {
        unreachable!("size score should be per device");
    };
    assert!((size.raspberry_pi - 1.0).abs() < 1e-9);

    for stub in [MetricName::Reproducibility, MetricName::Reviewedness, MetricName::TreeScore] {
        assert!((scalar(&rating, stub) - NOT_COMPUTED).abs() < f64::EPSILON);
        assert_eq!(rating.latency_ms(stub), Some(0));
    }

    assert_eq!(rating.summary().name, "tiny-model");
    assert_eq!(rating.summary().model_link, MODEL_URL);
    assert_eq!(rating.id(), "example/tiny-model");
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
async fn test_snapshots_are_removed_after_rating() {
    let git = Arc::new(FixtureGit::new(TINY_PROJECT));
    let scorer = scorer(&git);

    let _ = scorer.score(entry()).await.unwrap();
    let _ = scorer
        .score(Entry::new(Some("https://github.com/example/other"), None, "https://huggingface.co/example/other").unwrap())
        .await
        .unwrap();

    let dirs = git.snapshot_dirs();
    assert_eq!(dirs.len(), 2);
    assert_ne!(dirs[0], dirs[1]);
    assert!(dirs.iter().all(|dir| !dir.exists()));
}

#[tokio::test]
async fn test_clone_failure_falls_back_to_defaults() {
    let git = Arc::new(FixtureGit::failing());
    let rating = scorer(&git).score(entry()).await.unwrap();

    assert_complete(&rating);

    // Snapshot-based metrics fall back to zero, which stays distinguishable from the stubs.
    assert!(scalar(&rating, MetricName::License).abs() < f64::EPSILON);
    assert!(scalar(&rating, MetricName::BusFactor).abs() < f64::EPSILON);
    assert!((scalar(&rating, MetricName::Reviewedness) - NOT_COMPUTED).abs() < f64::EPSILON);

    // Only the code link is known.
    assert!((scalar(&rating, MetricName::DatasetAndCodeScore) - 0.4).abs() < 1e-9);
}

#[tokio::test]
async fn test_model_without_cloneable_repository() {
    let git = Arc::new(FixtureGit::new(TINY_PROJECT));
    let rating = scorer(&git)
        .score(Entry::new(None, None, "https://example.com/models/tiny").unwrap())
        .await
        .unwrap();

    assert_eq!(git.calls(), 0);
    assert_complete(&rating);
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
async fn test_unavailable_llm_does_not_sink_the_rating() {
    let git = Arc::new(FixtureGit::new(TINY_PROJECT));
    let orchestrator = orchestrator(&git, CannedLlm::unavailable(), PipelineSettings::default());

    let artifact = Artifact::from_entry(entry());
    let rating = orchestrator.score(&artifact, Utc::now()).await.unwrap();

    assert_complete(&rating);
    assert!((scalar(&rating, MetricName::License) - 1.0).abs() < 1e-9);
    assert!(scalar(&rating, MetricName::PerformanceClaims).abs() < f64::EPSILON);
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
async fn test_llm_answers_feed_the_readme_metrics() {
    let git = Arc::new(FixtureGit::new(TINY_PROJECT));
    let llm = CannedLlm::answering(r#"{"mentions_benchmarks": true, "has_metrics": true}"#);
    let orchestrator = orchestrator(&git, llm, PipelineSettings::default());

    let rating = orchestrator.score(&Artifact::from_entry(entry()), Utc::now()).await.unwrap();
    assert!((scalar(&rating, MetricName::PerformanceClaims) - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_time_budget_is_enforced() {
    let git = Arc::new(FixtureGit::slow(Duration::from_secs(10)));
    let settings = PipelineSettings {
        time_budget: Duration::from_millis(100),
        ..PipelineSettings::default()
    };
    let orchestrator = orchestrator(&git, CannedLlm::default_answer(), settings);

    let started = std::time::Instant::now();
    let err = orchestrator.score(&Artifact::from_entry(entry()), Utc::now()).await.unwrap_err();

    assert!(matches!(err, ScoringError::Timeout { .. }));
    assert_eq!(err.code(), "timeout");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
async fn test_entries_rate_concurrently_and_independently() {
    let git = Arc::new(FixtureGit::new(TINY_PROJECT));
    let scorer = Arc::new(scorer(&git));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let scorer = Arc::clone(&scorer);
            let code_url = format!("https://github.com/example/repo{i}");
            let entry = Entry::new(Some(code_url.as_str()), None, &format!("https://huggingface.co/example/m{i}")).unwrap();
            tokio::spawn(async move { scorer.score(entry).await })
        })
        .collect();

    let ratings: Vec<Rating> = futures_util::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    let ids: Vec<&str> = ratings.iter().map(Rating::id).collect();
    assert_eq!(ids, ["example/m0", "example/m1", "example/m2", "example/m3"]);
    assert_eq!(git.calls(), 4);
}
