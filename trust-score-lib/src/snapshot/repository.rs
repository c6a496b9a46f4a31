use super::LOG_TARGET;
use super::code_quality::{self, CodeQualityStats};
use super::commit_stats::CommitStats;
use super::git;
use super::ramp_up::{self, RampUpSignals};
use crate::Result;
use chrono::{DateTime, Utc};
use ohno::{IntoAppError, bail};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use url::Url;
use walkdir::WalkDir;

/// READMEs beyond this size are truncated when read.
const MAX_README_BYTES: usize = 512 * 1024;

/// Upper bound on the number of paths returned by [`RepositorySnapshot::files`].
const MAX_LISTED_FILES: usize = 20_000;

/// An ephemeral, read-only checkout of one repository.
///
/// The snapshot owns its directory. [`cleanup`](Self::cleanup) deletes it and may be called
/// any number of times; if it never is, the directory is removed on drop.
#[derive(Debug)]
pub struct RepositorySnapshot {
    reader: SnapshotReader,
    dir: Option<TempDir>,
}

/// Cheap, `'static` read access to a live snapshot, for handing to blocking workers.
///
/// A reader does not keep the directory alive; reads after cleanup fail or come back empty.
#[derive(Debug, Clone)]
pub struct SnapshotReader {
    source: Url,
    root: PathBuf,
}

impl RepositorySnapshot {
    /// Wrap a directory that already holds the repository's files.
    #[must_use]
    pub fn new(source: Url, dir: TempDir) -> Self {
        Self {
            reader: SnapshotReader {
                source,
                root: dir.path().to_path_buf(),
            },
            dir: Some(dir),
        }
    }

    /// The (normalized) URL the snapshot was taken from.
    #[must_use]
    pub const fn source(&self) -> &Url {
        &self.reader.source
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.reader.root
    }

    /// A detached reader over this snapshot.
    pub fn reader(&self) -> Result<SnapshotReader> {
        if self.is_cleaned_up() {
            bail!("snapshot of '{}' has already been cleaned up", self.reader.source);
        }

        Ok(self.reader.clone())
    }

    /// Contents of the top-level README, if there is one.
    #[must_use]
    pub fn read_readme(&self) -> Option<String> {
        self.reader().ok()?.read_readme()
    }

    /// Contents of the top-level license file, if there is one.
    #[must_use]
    pub fn read_license_file(&self) -> Option<String> {
        self.reader().ok()?.read_license_file()
    }

    /// Commit authorship over the `cap` most recent commits made since `since`. Blocking.
    pub fn analyze_commits(&self, since: DateTime<Utc>, cap: usize) -> Result<CommitStats> {
        self.reader()?.analyze_commits(since, cap)
    }

    /// Lint results and test presence. Blocking.
    pub fn analyze_code_quality(&self) -> Result<CodeQualityStats> {
        Ok(self.reader()?.analyze_code_quality())
    }

    /// Total size in bytes of all files outside `.git`. Blocking.
    pub fn repository_size(&self) -> Result<u64> {
        self.reader()?.repository_size()
    }

    /// Example and dependency-manifest presence. Blocking.
    pub fn analyze_ramp_up_signals(&self) -> Result<RampUpSignals> {
        Ok(self.reader()?.analyze_ramp_up_signals())
    }

    /// Paths of all files outside `.git`, relative to the snapshot root, walked in name order.
    pub fn files(&self) -> Result<Vec<PathBuf>> {
        Ok(self.reader()?.files())
    }

    /// Delete the snapshot directory. Idempotent.
    pub fn cleanup(&mut self) -> Result<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };

        log::debug!(target: LOG_TARGET, "Removing snapshot of '{}' at '{}'", self.reader.source, self.reader.root.display());
        dir.close()
            .into_app_err_with(|| format!("removing snapshot directory '{}'", self.reader.root.display()))
    }

    #[must_use]
    pub const fn is_cleaned_up(&self) -> bool {
        self.dir.is_none()
    }
}

impl SnapshotReader {
    #[must_use]
    pub const fn source(&self) -> &Url {
        &self.source
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.root
    }

    fn first_top_level_file(&self, prefixes: &[&str]) -> Option<PathBuf> {
        let mut candidates: Vec<PathBuf> = fs::read_dir(&self.root)
            .ok()?
            .filter_map(core::result::Result::ok)
            .filter(|e| e.file_type().is_ok_and(|t| t.is_file()))
            .filter(|e| {
                let name = e.file_name().to_string_lossy().to_ascii_lowercase();
                prefixes.iter().any(|p| name.starts_with(p))
            })
            .map(|e| e.path())
            .collect();

        candidates.sort();
        candidates.into_iter().next()
    }

    fn read_text(path: &Path) -> Option<String> {
        let mut bytes = fs::read(path).ok()?;
        bytes.truncate(MAX_README_BYTES);
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }

    #[must_use]
    pub fn read_readme(&self) -> Option<String> {
        let path = self.first_top_level_file(&["readme"])?;
        log::debug!(target: LOG_TARGET, "Reading '{}'", path.display());
        Self::read_text(&path)
    }

    #[must_use]
    pub fn read_license_file(&self) -> Option<String> {
        let path = self.first_top_level_file(&["license", "licence", "copying"])?;
        Self::read_text(&path)
    }

    pub fn analyze_commits(&self, since: DateTime<Utc>, cap: usize) -> Result<CommitStats> {
        let authors = git::recent_authors(&self.root, since, cap)?;
        Ok(CommitStats::from_authors(authors))
    }

    #[must_use]
    pub fn analyze_code_quality(&self) -> CodeQualityStats {
        code_quality::analyze(&self.root)
    }

    pub fn repository_size(&self) -> Result<u64> {
        let mut total = 0_u64;
        for entry in WalkDir::new(&self.root).into_iter().filter_entry(|e| e.file_name() != ".git") {
            let entry = entry.into_app_err_with(|| format!("walking snapshot of '{}'", self.source))?;
            if entry.file_type().is_file() {
                total += entry
                    .metadata()
                    .into_app_err_with(|| format!("reading metadata of '{}'", entry.path().display()))?
                    .len();
            }
        }

        Ok(total)
    }

    #[must_use]
    pub fn analyze_ramp_up_signals(&self) -> RampUpSignals {
        ramp_up::analyze(&self.root)
    }

    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
            .filter_map(core::result::Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| e.path().strip_prefix(&self.root).ok().map(Path::to_path_buf))
            .take(MAX_LISTED_FILES)
            .collect()
    }
}
