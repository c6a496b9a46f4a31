//! Shared fakes for the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset of the fakes")]

use core::time::Duration;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use trust_score_lib::Result;
use trust_score_lib::cache::{MemoryRatingStore, RatingCache, RatingStore};
use trust_score_lib::pipeline::{Orchestrator, PipelineSettings, TrustScorer};
use trust_score_lib::scheduler::WorkerPool;
use trust_score_lib::services::{DEFAULT_CHAT_RESPONSE, DatasetInfo, DatasetMetadataProvider, LlmProvider};
use trust_score_lib::snapshot::{CloneFailure, CloneFailureKind, GitProvider, RepositorySnapshot};
use url::Url;

/// A small Python project with an MIT license section, tests, and a training script.
pub const TINY_PROJECT: &[(&str, &str)] = &[
    ("README.md", "# Tiny\n\nA tiny text classifier.\n\n## License\nMIT\n"),
    ("tests/test_model.py", "def test_predict():\n    assert 1 + 1 == 2\n"),
    ("train.py", "def main():\n    return 0\n"),
];

/// Materializes a fixed file tree for every clone instead of running git.
#[derive(Debug)]
pub struct FixtureGit {
    files: &'static [(&'static str, &'static str)],
    delay: Duration,
    fail: bool,
    calls: AtomicUsize,
    snapshot_dirs: Mutex<Vec<PathBuf>>,
}

impl FixtureGit {
    pub fn new(files: &'static [(&'static str, &'static str)]) -> Self {
        Self {
            files,
            delay: Duration::ZERO,
            fail: false,
            calls: AtomicUsize::new(0),
            snapshot_dirs: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::new(&[]) }
    }

    pub fn slow(delay: Duration) -> Self {
        Self { delay, ..Self::new(TINY_PROJECT) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn snapshot_dirs(&self) -> Vec<PathBuf> {
        self.snapshot_dirs.lock().unwrap().clone()
    }
}

impl GitProvider for FixtureGit {
    fn clone_repository<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, core::result::Result<RepositorySnapshot, CloneFailure>> {
        async move {
            let _ = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;

            if self.fail {
                return Err(CloneFailure::new(CloneFailureKind::NotFound, "repository not found"));
            }

            let dir = tempfile::tempdir().map_err(|e| CloneFailure::new(CloneFailureKind::Other, e.to_string()))?;
            for (relative, contents) in self.files {
                let path = dir.path().join(relative);
                fs::create_dir_all(path.parent().unwrap()).unwrap();
                fs::write(&path, contents).unwrap();
            }

            self.snapshot_dirs.lock().unwrap().push(dir.path().to_path_buf());
            Ok(RepositorySnapshot::new(url.clone(), dir))
        }
        .boxed()
    }
}

/// Answers every prompt with a fixed reply, or fails every call.
#[derive(Debug)]
pub struct CannedLlm {
    answer: Option<String>,
}

impl CannedLlm {
    pub fn default_answer() -> Self {
        Self {
            answer: Some(DEFAULT_CHAT_RESPONSE.to_string()),
        }
    }

    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
        }
    }

    pub const fn unavailable() -> Self {
        Self { answer: None }
    }
}

impl LlmProvider for CannedLlm {
    fn chat<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        async move {
            match &self.answer {
                Some(answer) => Ok(answer.clone()),
                None => Err(ohno::app_err!("chat service unavailable")),
            }
        }
        .boxed()
    }
}

/// Knows the metadata of exactly one dataset.
#[derive(Debug, Default)]
pub struct OneDataset {
    pub id: &'static str,
    pub info: DatasetInfo,
}

impl DatasetMetadataProvider for OneDataset {
    fn dataset_info<'a>(&'a self, repo_id: &'a str) -> BoxFuture<'a, Result<Option<DatasetInfo>>> {
        async move { Ok((repo_id == self.id).then_some(self.info)) }.boxed()
    }
}

pub fn orchestrator(git: &Arc<FixtureGit>, llm: CannedLlm, settings: PipelineSettings) -> Orchestrator {
    Orchestrator::new(
        Arc::clone(git) as Arc<dyn GitProvider>,
        Arc::new(llm),
        Arc::new(OneDataset::default()),
        WorkerPool::new(4),
        settings,
    )
}

pub fn scorer_with_store(git: &Arc<FixtureGit>, store: Arc<dyn RatingStore>, ttl: Duration) -> TrustScorer {
    TrustScorer::new(
        orchestrator(git, CannedLlm::default_answer(), PipelineSettings::default()),
        RatingCache::new(store, ttl),
    )
}

pub fn scorer(git: &Arc<FixtureGit>) -> TrustScorer {
    scorer_with_store(git, Arc::new(MemoryRatingStore::new()), Duration::from_secs(60))
}
