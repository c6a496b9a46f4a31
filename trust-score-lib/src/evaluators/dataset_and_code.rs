//! Whether the training dataset and the training code are both documented and available.

use super::evaluator::{EvalContext, EvaluatorError, Score};
use crate::snapshot::SnapshotReader;
use crate::sources::{Entry, SourceKind, classify};
use regex::{Regex, RegexSet};
use std::path::Path;
use std::sync::LazyLock;

const DATASET_WEIGHT: f64 = 0.6;
const CODE_WEIGHT: f64 = 0.4;

/// Python sources larger than this are not scanned for training keywords.
const MAX_SCANNED_BYTES: u64 = 512 * 1024;
const MAX_SCANNED_FILES: usize = 500;

const CONFIG_FILES: &[&str] = &["config.json", "config.yaml", "config.yml", "configuration.json", "settings.json"];

const DATA_DIRS: &[&str] = &[
    "data",
    "datasets",
    "dataset",
    "raw_data",
    "processed_data",
    "data_files",
    "data_dir",
];

const TRAINING_KEYWORDS: &[&str] = &[
    "model.fit(",
    "trainer.train(",
    "optimizer.step(",
    "loss.backward(",
    "train_epoch",
    "training_loop",
    "train_dataloader",
    "train_loader",
    "from torch.optim",
    "from transformers import trainer",
    "from tensorflow.keras",
];

static DATASET_REFERENCES: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"huggingface\.co/datasets/",
        r"kaggle\.com/",
        r"zenodo\.org/",
        r"figshare\.com/",
        r"archive\.ics\.uci\.edu",
        r"data\.world/",
        r"paperswithcode\.com/datasets/",
        r"openml\.org/d/",
        r"image-net\.org",
        r"\btraining data\b",
        r"\bdata (source|link|url|repository)\b",
        r#"\bdatasets?"?\s*[:=]"#,
        r"\bdatasets?\s+(is|are|available|from|at|can be|used|for training)\b",
        r"\busing\s+(the\s+)?datasets?\b",
        r"\b(trained|fine-?tuned|pre-?trained)\s+on\b",
    ])
    .expect("valid regex set")
});

static DATASET_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(data|dataset|train|test|validation|valid|dev)\.(csv|tsv|json|jsonl|txt|parquet)$").expect("valid regex")
});

static TRAINING_SCRIPT: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(^|/)(train|training|finetune|fine_tune|fine-tune|model_train|train_model|run_training|train_script|experiment)\.py$",
        r"(^|/)train_[^/]*\.py$",
        r"(^|/)[^/]*fine_?tune[^/]*\.py$",
        r"(^|/)experiments/[^/]+\.py$",
        r"(^|/)scripts/(train|finetune)[^/]*\.py$",
        r"(^|/)[^/]*(train|finetune|training|experiment)[^/]*\.ipynb$",
    ])
    .expect("valid regex set")
});

/// The two 0/1 indicators this metric is made of.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetCodeIndicators {
    pub has_dataset_info: bool,
    pub has_training_code: bool,
}

impl DatasetCodeIndicators {
    #[must_use]
    pub fn score(self) -> f64 {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        DATASET_WEIGHT * flag(self.has_dataset_info) + CODE_WEIGHT * flag(self.has_training_code)
    }
}

/// Whether free text points at a dataset.
#[must_use]
pub fn mentions_dataset(text: &str) -> bool {
    DATASET_REFERENCES.is_match(&text.to_lowercase())
}

/// Whether a repository-relative path looks like a training script or notebook.
#[must_use]
pub fn is_training_script(relative: &str) -> bool {
    TRAINING_SCRIPT.is_match(&relative.to_lowercase())
}

fn is_training_source(path: &Path) -> bool {
    let small = std::fs::metadata(path).is_ok_and(|m| m.len() <= MAX_SCANNED_BYTES);
    if !small {
        return false;
    }

    std::fs::read(path).is_ok_and(|bytes| {
        let content = String::from_utf8_lossy(&bytes).to_lowercase();
        TRAINING_KEYWORDS.iter().any(|k| content.contains(k))
    })
}

fn has_dataset_files(files: &[String]) -> bool {
    files.iter().any(|rel| {
        let first = rel.split('/').next().unwrap_or_default();
        let is_nested = rel.contains('/');
        let name = rel.rsplit('/').next().unwrap_or_default();

        (is_nested && DATA_DIRS.contains(&first)) || DATASET_FILE.is_match(name)
    })
}

/// Inspect a snapshot for dataset documentation and training code.
#[must_use]
pub fn detect(reader: &SnapshotReader, readme: Option<&str>) -> DatasetCodeIndicators {
    let paths = reader.files();
    let files: Vec<String> = paths
        .iter()
        .map(|p| p.to_string_lossy().replace('\\', "/").to_lowercase())
        .collect();

    let has_dataset_info = readme.is_some_and(mentions_dataset)
        || CONFIG_FILES.iter().any(|name| {
            std::fs::read(reader.path().join(name)).is_ok_and(|bytes| mentions_dataset(&String::from_utf8_lossy(&bytes)))
        })
        || has_dataset_files(&files);

    let has_training_code = files.iter().any(|rel| is_training_script(rel))
        || paths
            .iter()
            .filter(|p| p.extension().is_some_and(|e| e.eq_ignore_ascii_case("py")))
            .take(MAX_SCANNED_FILES)
            .any(|p| is_training_source(&reader.path().join(p)));

    DatasetCodeIndicators {
        has_dataset_info,
        has_training_code,
    }
}

/// The estimate used when there is no snapshot to inspect.
#[must_use]
pub fn link_fallback(has_dataset_link: bool, has_code_link: bool) -> f64 {
    DatasetCodeIndicators {
        has_dataset_info: has_dataset_link,
        has_training_code: has_code_link,
    }
    .score()
}

/// Whether the entry links to a code repository, as opposed to some other page.
#[must_use]
pub fn has_code_repository_link(entry: &Entry) -> bool {
    entry.code_url().is_some_and(|url| classify(url) == SourceKind::Code)
}

pub(super) async fn evaluate(ctx: &EvalContext<'_>) -> Result<Score, EvaluatorError> {
    let has_dataset_link = ctx.entry.dataset_url().is_some();

    let reader = match ctx.reader() {
        Ok(reader) => reader,
        Err(EvaluatorError::MissingSnapshot) => {
            return Ok(Score::Value(link_fallback(has_dataset_link, has_code_repository_link(ctx.entry))));
        }
        Err(e) => return Err(e),
    };

    let readme = ctx.readme.map(str::to_string);
    let mut indicators = ctx.on_pool(move || detect(&reader, readme.as_deref())).await?;
    indicators.has_dataset_info |= has_dataset_link;

    Ok(Score::Value(indicators.score()))
}
