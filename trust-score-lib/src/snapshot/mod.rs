//! Ephemeral repository snapshots.
//!
//! A [`GitProvider`] turns a repository URL into a [`RepositorySnapshot`]: a shallow,
//! single-branch clone in a fresh temporary directory that belongs to exactly one analysis.
//! The snapshot offers read-only helpers for the analyses that need the working tree, and
//! deletes its directory on [`RepositorySnapshot::cleanup`] or on drop.

mod code_quality;
mod commit_stats;
mod git;
mod provider;
mod ramp_up;
mod repository;

pub use code_quality::{CodeQualityStats, lint_source};
pub use commit_stats::CommitStats;
pub use git::{classify_failure, normalize_repo_url, redact};
pub use provider::{CloneFailure, CloneFailureKind, GitCli, GitProvider};
pub use ramp_up::RampUpSignals;
pub use repository::{RepositorySnapshot, SnapshotReader};

const LOG_TARGET: &str = "  snapshot";
