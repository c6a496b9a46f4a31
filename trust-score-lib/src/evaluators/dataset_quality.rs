//! Dataset popularity as a proxy for dataset quality.

use super::LOG_TARGET;
use super::evaluator::{EvalContext, EvaluatorError, Score};
use crate::services::{DatasetInfo, DatasetMetadataProvider};
use crate::sources::hf_dataset_id;
use regex::Regex;
use std::sync::LazyLock;

const LIKES_WEIGHT: f64 = 0.5;
const DOWNLOADS_WEIGHT: f64 = 0.5;

/// Counts at or above these saturate the normalized score.
const MAX_LIKES: u64 = 9_030;
const MAX_DOWNLOADS: u64 = 4_180_000;

/// Score given to a dataset hosted somewhere we cannot query.
pub const UNKNOWN_HOST_SCORE: f64 = 0.5;

static HF_DATASET_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"huggingface\.co/datasets/[\w.\-]+(/[\w.\-]+)?").expect("valid regex"));

/// `min(1, ln(1 + v) / ln(1 + max))`, or 0 when `v` is 0.
#[must_use]
#[expect(clippy::cast_precision_loss, reason = "log-scaled counts do not need full precision")]
pub fn normalize(value: u64, max: u64) -> f64 {
    if value == 0 || max == 0 {
        return 0.0;
    }

    ((value as f64).ln_1p() / (max as f64).ln_1p()).min(1.0)
}

#[must_use]
pub fn dataset_quality_score(info: DatasetInfo) -> f64 {
    (LIKES_WEIGHT * normalize(info.likes, MAX_LIKES) + DOWNLOADS_WEIGHT * normalize(info.downloads, MAX_DOWNLOADS)).clamp(0.0, 1.0)
}

/// The first Hugging Face dataset id mentioned in a README.
#[must_use]
pub fn find_dataset_reference(readme: &str) -> Option<String> {
    HF_DATASET_LINK.find_iter(readme).find_map(|m| hf_dataset_id(m.as_str()))
}

async fn score_hub_dataset(datasets: &dyn DatasetMetadataProvider, repo_id: &str) -> Result<Score, EvaluatorError> {
    match datasets.dataset_info(repo_id).await {
        Ok(Some(info)) => Ok(Score::Value(dataset_quality_score(info))),
        Ok(None) => {
            log::info!(target: LOG_TARGET, "Dataset '{repo_id}' does not exist on the hub");
            Ok(Score::Value(0.0))
        }
        Err(e) => Err(EvaluatorError::ServiceUnavailable(e)),
    }
}

/// Score an explicitly supplied dataset URL.
///
/// Hugging Face datasets are looked up; datasets elsewhere get [`UNKNOWN_HOST_SCORE`].
pub async fn score_dataset_url(datasets: &dyn DatasetMetadataProvider, dataset_url: &str) -> Result<Score, EvaluatorError> {
    match hf_dataset_id(dataset_url) {
        Some(repo_id) => score_hub_dataset(datasets, &repo_id).await,
        None => Ok(Score::Value(UNKNOWN_HOST_SCORE)),
    }
}

pub(super) async fn evaluate(ctx: &EvalContext<'_>) -> Result<Score, EvaluatorError> {
    if ctx.snapshot.is_none() {
        return Err(EvaluatorError::MissingSnapshot);
    }

    let Some(repo_id) = ctx.readme.and_then(find_dataset_reference) else {
        return Ok(Score::NotApplicable);
    };

    score_hub_dataset(ctx.datasets, &repo_id).await
}
