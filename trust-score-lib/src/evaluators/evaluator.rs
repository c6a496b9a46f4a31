use super::size::SizeScore;
use super::{
    LOG_TARGET, bus_factor, code_quality, dataset_and_code, dataset_quality, license, performance_claims, ramp_up_time, size,
};
use crate::scheduler::WorkerPool;
use crate::services::{DatasetMetadataProvider, LlmProvider};
use crate::snapshot::{RepositorySnapshot, SnapshotReader};
use crate::sources::Entry;
use chrono::{DateTime, TimeDelta, Utc};
use core::fmt;
use ohno::AppError;
use strum::{AsRefStr, Display, EnumIter, IntoStaticStr};

/// The keys under which scores and latencies are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum MetricName {
    BusFactor,
    CodeQuality,
    License,
    RampUpTime,
    DatasetQuality,
    PerformanceClaims,
    SizeScore,
    DatasetAndCodeScore,
    Reproducibility,
    Reviewedness,
    TreeScore,
    NetScore,
}

impl MetricName {
    /// Metrics that are reported but never computed.
    pub const STUBS: [Self; 3] = [Self::Reproducibility, Self::Reviewedness, Self::TreeScore];
}

/// What an evaluator produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Score {
    Value(f64),
    Devices(SizeScore),

    /// The metric does not apply to this artifact, as opposed to scoring zero.
    NotApplicable,
}

impl Score {
    /// The scalar used when weighting this score. Not-applicable scores count as zero.
    #[must_use]
    pub const fn weight_value(&self) -> f64 {
        match self {
            Self::Value(v) => *v,
            Self::Devices(_) | Self::NotApplicable => 0.0,
        }
    }
}

/// Why an evaluator could not produce a score.
#[derive(Debug)]
pub enum EvaluatorError {
    /// The evaluator needs a repository snapshot and there is none.
    MissingSnapshot,

    /// An external service the evaluator depends on could not be used.
    ServiceUnavailable(AppError),

    /// Anything else.
    Failed(AppError),
}

impl fmt::Display for EvaluatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSnapshot => write!(f, "no repository snapshot available"),
            Self::ServiceUnavailable(e) => write!(f, "service unavailable: {e}"),
            Self::Failed(e) => write!(f, "evaluation failed: {e}"),
        }
    }
}

impl core::error::Error for EvaluatorError {}

/// Everything an evaluator may look at while scoring one entry.
///
/// The snapshot is shared by all evaluators of the entry and must not be modified.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    pub snapshot: Option<&'a RepositorySnapshot>,
    pub entry: &'a Entry,
    pub readme: Option<&'a str>,
    pub pool: &'a WorkerPool,
    pub llm: &'a dyn LlmProvider,
    pub datasets: &'a dyn DatasetMetadataProvider,
    pub commit_window: TimeDelta,
    pub max_commits: usize,
    pub now: DateTime<Utc>,
}

impl EvalContext<'_> {
    /// A detached reader over the snapshot, for work submitted to the pool.
    pub fn reader(&self) -> Result<SnapshotReader, EvaluatorError> {
        let snapshot = self.snapshot.ok_or(EvaluatorError::MissingSnapshot)?;
        snapshot.reader().map_err(EvaluatorError::Failed)
    }

    /// Run blocking work on the pool and return its value.
    pub async fn on_pool<F, T>(&self, work: F) -> Result<T, EvaluatorError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.pool.submit(work).await.map(|timed| timed.value).map_err(EvaluatorError::Failed)
    }
}

/// One of the independent scoring units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Evaluator {
    BusFactor,
    CodeQuality,
    License,
    RampUpTime,
    DatasetQuality,
    PerformanceClaims,
    Size,
    DatasetAndCode,
}

impl Evaluator {
    /// Every evaluator, in reporting order.
    pub const ALL: [Self; 8] = [
        Self::BusFactor,
        Self::CodeQuality,
        Self::License,
        Self::RampUpTime,
        Self::DatasetQuality,
        Self::PerformanceClaims,
        Self::Size,
        Self::DatasetAndCode,
    ];

    /// The key this evaluator reports under.
    #[must_use]
    pub const fn metric(self) -> MetricName {
        match self {
            Self::BusFactor => MetricName::BusFactor,
            Self::CodeQuality => MetricName::CodeQuality,
            Self::License => MetricName::License,
            Self::RampUpTime => MetricName::RampUpTime,
            Self::DatasetQuality => MetricName::DatasetQuality,
            Self::PerformanceClaims => MetricName::PerformanceClaims,
            Self::Size => MetricName::SizeScore,
            Self::DatasetAndCode => MetricName::DatasetAndCodeScore,
        }
    }

    /// The score reported when this evaluator could not run at all.
    #[must_use]
    pub const fn default_score(self) -> Score {
        match self {
            Self::DatasetQuality => Score::NotApplicable,
            Self::Size => Score::Devices(SizeScore::DEFAULT),
            _ => Score::Value(0.0),
        }
    }

    /// The score reported when an external service was unavailable.
    #[must_use]
    pub const fn neutral_score(self) -> Score {
        match self {
            Self::DatasetQuality => Score::Value(0.5),
            _ => self.default_score(),
        }
    }

    /// The score that replaces a failed evaluation.
    #[must_use]
    pub const fn fallback(self, error: &EvaluatorError) -> Score {
        match error {
            EvaluatorError::ServiceUnavailable(_) => self.neutral_score(),
            EvaluatorError::MissingSnapshot | EvaluatorError::Failed(_) => self.default_score(),
        }
    }

    /// Score the entry described by `ctx`.
    pub async fn evaluate(self, ctx: &EvalContext<'_>) -> Result<Score, EvaluatorError> {
        log::debug!(target: LOG_TARGET, "Running the {self} evaluator");

        match self {
            Self::BusFactor => bus_factor::evaluate(ctx).await,
            Self::CodeQuality => code_quality::evaluate(ctx).await,
            Self::License => license::evaluate(ctx).await,
            Self::RampUpTime => ramp_up_time::evaluate(ctx).await,
            Self::DatasetQuality => dataset_quality::evaluate(ctx).await,
            Self::PerformanceClaims => performance_claims::evaluate(ctx).await,
            Self::Size => size::evaluate(ctx).await,
            Self::DatasetAndCode => dataset_and_code::evaluate(ctx).await,
        }
    }
}
