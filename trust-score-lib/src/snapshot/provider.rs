use super::LOG_TARGET;
use super::git::{normalize_repo_url, shallow_clone};
use super::repository::RepositorySnapshot;
use core::fmt;
use core::time::Duration;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use std::time::Instant;
use strum::Display;
use url::Url;

/// Why a clone did not produce a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum CloneFailureKind {
    Authentication,
    NotFound,
    Network,
    Timeout,
    Other,
}

/// A failed clone, with git's (redacted) diagnostics.
#[derive(Debug, Clone)]
pub struct CloneFailure {
    kind: CloneFailureKind,
    message: String,
}

impl CloneFailure {
    #[must_use]
    pub fn new(kind: CloneFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> CloneFailureKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CloneFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "clone failed ({}): {}", self.kind, self.message)
    }
}

impl core::error::Error for CloneFailure {}

/// Source of repository snapshots.
///
/// Every successful call yields a fresh, exclusively owned snapshot; two calls never share a
/// directory.
pub trait GitProvider: Send + Sync + fmt::Debug {
    fn clone_repository<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<RepositorySnapshot, CloneFailure>>;
}

/// [`GitProvider`] backed by the `git` command-line tool.
#[derive(Clone)]
pub struct GitCli {
    token: Option<String>,
    depth: u32,
    timeout: Duration,
}

impl GitCli {
    #[must_use]
    pub fn new(token: Option<&str>, depth: u32, timeout: Duration) -> Self {
        Self {
            token: token.filter(|t| !t.is_empty()).map(str::to_string),
            depth,
            timeout,
        }
    }

    async fn clone_core(&self, url: &Url) -> Result<RepositorySnapshot, CloneFailure> {
        let start_time = Instant::now();
        let repo_url = normalize_repo_url(url);

        let dir = tempfile::Builder::new()
            .prefix("trust-score-")
            .tempdir()
            .map_err(|e| CloneFailure::new(CloneFailureKind::Other, format!("could not create snapshot directory: {e}")))?;

        log::info!(target: LOG_TARGET, "Cloning '{repo_url}'");
        shallow_clone(&repo_url, dir.path(), self.depth, self.token.as_deref(), self.timeout).await?;

        log::debug!(
            target: LOG_TARGET,
            "Cloned '{repo_url}' into '{}' in {:.3}s",
            dir.path().display(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(RepositorySnapshot::new(repo_url, dir))
    }
}

impl fmt::Debug for GitCli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitCli")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("depth", &self.depth)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GitProvider for GitCli {
    fn clone_repository<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Result<RepositorySnapshot, CloneFailure>> {
        self.clone_core(url).boxed()
    }
}
