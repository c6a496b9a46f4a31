//! Runs one entry through clone, fan-out, and aggregation inside a time budget.

use super::LOG_TARGET;
use super::aggregator::aggregate;
use super::rating::{MetricResult, Rating};
use super::scoring_error::ScoringError;
use crate::evaluators::{EvalContext, Evaluator, EvaluatorError, MetricName, Score, score_dataset_url};
use crate::scheduler::{Timed, WorkerPool};
use crate::services::{DatasetMetadataProvider, LlmProvider};
use crate::snapshot::{GitProvider, RepositorySnapshot};
use crate::sources::{Artifact, Entry, select_primary_repo};
use chrono::{DateTime, TimeDelta, Utc};
use core::time::Duration;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Instant;

/// Tunables for a single rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Upper bound on the wall-clock time for one entry.
    pub time_budget: Duration,

    /// How far back to look for commits.
    pub commit_window: TimeDelta,

    /// Most commits to inspect.
    pub max_commits: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_secs(60),
            commit_window: TimeDelta::days(365),
            max_commits: 100,
        }
    }
}

/// Drives the evaluators for one entry at a time.
///
/// Holds only shared, read-only collaborators, so one orchestrator can score many entries
/// concurrently.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    git: Arc<dyn GitProvider>,
    llm: Arc<dyn LlmProvider>,
    datasets: Arc<dyn DatasetMetadataProvider>,
    pool: WorkerPool,
    settings: PipelineSettings,
}

impl Orchestrator {
    #[must_use]
    pub fn new(
        git: Arc<dyn GitProvider>,
        llm: Arc<dyn LlmProvider>,
        datasets: Arc<dyn DatasetMetadataProvider>,
        pool: WorkerPool,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            git,
            llm,
            datasets,
            pool,
            settings,
        }
    }

    #[must_use]
    pub const fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Rate `artifact`, stamping the rating with `now`.
    ///
    /// Fails with [`ScoringError::Timeout`] when the budget runs out; no partial rating is
    /// returned in that case and the snapshot, if any, is removed.
    pub async fn score(&self, artifact: &Artifact, now: DateTime<Utc>) -> Result<Rating, ScoringError> {
        let budget = self.settings.time_budget;

        match tokio::time::timeout(budget, self.score_core(artifact, now)).await {
            Ok(rating) => Ok(rating),
            Err(_) => {
                log::warn!(target: LOG_TARGET, "Rating '{}' exceeded its time budget of {budget:?}", artifact.id());
                Err(ScoringError::Timeout { budget })
            }
        }
    }

    async fn score_core(&self, artifact: &Artifact, now: DateTime<Utc>) -> Rating {
        let start = Instant::now();
        let entry = artifact.entry();

        log::info!(target: LOG_TARGET, "Rating '{}'", artifact.id());

        let (mut results, focused) = tokio::join!(self.evaluate_entry(entry, now), self.focused_dataset_lookup(entry));

        if let Some(focused) = focused
            && let Some(slot) = results.iter_mut().find(|r| r.name == MetricName::DatasetQuality)
        {
            *slot = focused;
        }

        let rating = aggregate(artifact, &results, start.elapsed(), now);
        log::info!(
            target: LOG_TARGET,
            "Rated '{}': net score {:.2} in {}ms",
            artifact.id(),
            rating.net_score().unwrap_or_default(),
            start.elapsed().as_millis()
        );

        rating
    }

    /// Score an explicitly supplied dataset URL. Needs no snapshot, so it runs alongside the clone.
    async fn focused_dataset_lookup(&self, entry: &Entry) -> Option<MetricResult> {
        let dataset_url = entry.dataset_url()?;
        let timed = self.pool.await_io(score_dataset_url(self.datasets.as_ref(), dataset_url)).await;
        Some(settle(Evaluator::DatasetQuality, timed))
    }

    async fn clone_primary(&self, entry: &Entry) -> Option<RepositorySnapshot> {
        let Some(url) = select_primary_repo(entry) else {
            log::info!(target: LOG_TARGET, "No cloneable repository for '{}', using default metrics", entry.model_url());
            return None;
        };

        let timed = self.pool.await_io(self.git.clone_repository(&url)).await;
        let elapsed_ms = timed.elapsed_ms();
        match timed.value {
            Ok(snapshot) => {
                log::debug!(target: LOG_TARGET, "Cloned '{url}' in {elapsed_ms}ms");
                Some(snapshot)
            }
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Using default metrics for '{}': {e}", entry.model_url());
                None
            }
        }
    }

    async fn read_readme(&self, snapshot: &RepositorySnapshot) -> Option<String> {
        let reader = snapshot.reader().ok()?;
        match self.pool.submit(move || reader.read_readme()).await {
            Ok(timed) => timed.value,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "Could not read the README of '{}': {e:#}", snapshot.source());
                None
            }
        }
    }

    async fn evaluate_entry(&self, entry: &Entry, now: DateTime<Utc>) -> Vec<MetricResult> {
        let mut snapshot = self.clone_primary(entry).await;

        let readme = match &snapshot {
            Some(s) => self.read_readme(s).await,
            None => None,
        };

        let ctx = EvalContext {
            snapshot: snapshot.as_ref(),
            entry,
            readme: readme.as_deref(),
            pool: &self.pool,
            llm: self.llm.as_ref(),
            datasets: self.datasets.as_ref(),
            commit_window: self.settings.commit_window,
            max_commits: self.settings.max_commits,
            now,
        };

        let results = join_all(Evaluator::ALL.iter().map(|evaluator| run_evaluator(*evaluator, &ctx))).await;

        if let Some(snapshot) = snapshot.as_mut()
            && let Err(e) = snapshot.cleanup()
        {
            log::warn!(target: LOG_TARGET, "Could not remove the snapshot of '{}': {e:#}", snapshot.source());
        }

        results
    }
}

async fn run_evaluator(evaluator: Evaluator, ctx: &EvalContext<'_>) -> MetricResult {
    let timed = ctx.pool.await_io(evaluator.evaluate(ctx)).await;
    settle(evaluator, timed)
}

/// Turn an evaluation outcome into a result, substituting the fallback score on failure.
fn settle(evaluator: Evaluator, timed: Timed<Result<Score, EvaluatorError>>) -> MetricResult {
    let name = evaluator.metric();
    match timed.value {
        Ok(score) => MetricResult::computed(name, score, timed.elapsed),
        Err(EvaluatorError::MissingSnapshot) => {
            log::debug!(target: LOG_TARGET, "{evaluator} needs a snapshot, using its default");
            MetricResult::defaulted(name, evaluator.default_score(), timed.elapsed, EvaluatorError::MissingSnapshot.to_string())
        }
        Err(e) => {
            log::warn!(target: LOG_TARGET, "{evaluator} evaluator failed, using its fallback: {e}");
            MetricResult::defaulted(name, evaluator.fallback(&e), timed.elapsed, e.to_string())
        }
    }
}
