use super::LOG_TARGET;
use super::provider::{CloneFailure, CloneFailureKind};
use crate::Result;
use chrono::{DateTime, Utc};
use core::time::Duration;
use ohno::{IntoAppError, bail};
use regex::Regex;
use std::path::Path;
use std::process::{Output, Stdio};
use std::sync::LazyLock;
use tokio::process::Command;
use url::Url;

/// Path segments that open a web view of a repository rather than the repository itself.
const VIEW_SEGMENTS: &[&str] = &[
    "tree", "blob", "commit", "commits", "releases", "release", "issues", "issue", "pull", "pulls", "wiki", "-",
];

/// The only host that receives the access token.
const TOKEN_HOST: &str = "github.com";

static USERINFO: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(https?://)[^/@\s]+@").expect("valid regex"));

/// Turn a web-UI URL into the URL of the repository it shows.
///
/// Drops query, fragment, any view suffix such as `/tree/main` or `/issues/12`, and the
/// trailing slash.
#[must_use]
pub fn normalize_repo_url(url: &Url) -> Url {
    let mut normalized = url.clone();
    normalized.set_query(None);
    normalized.set_fragment(None);

    let kept: Vec<String> = url
        .path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .enumerate()
                .take_while(|(i, s)| *i == 0 || !VIEW_SEGMENTS.contains(s))
                .map(|(_, s)| s.to_string())
                .collect()
        })
        .unwrap_or_default();

    normalized.set_path(&kept.join("/"));
    normalized
}

/// The URL handed to git, carrying the token for hosts that accept it.
fn transport_url(url: &Url, token: Option<&str>) -> Url {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return url.clone();
    };

    if url.host_str() != Some(TOKEN_HOST) {
        return url.clone();
    }

    let mut authed = url.clone();
    if authed.set_username("x-access-token").is_err() || authed.set_password(Some(token)).is_err() {
        return url.clone();
    }

    authed
}

/// Remove credentials from text produced by git before it is logged or surfaced.
#[must_use]
pub fn redact(text: &str, token: Option<&str>) -> String {
    let mut redacted = USERINFO.replace_all(text, "${1}***@").into_owned();
    if let Some(token) = token.filter(|t| !t.is_empty()) {
        redacted = redacted.replace(token, "***");
    }

    redacted
}

/// Classify a failed clone from git's error output.
#[must_use]
pub fn classify_failure(stderr: &str) -> CloneFailureKind {
    let text = stderr.to_ascii_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| text.contains(n));

    if has(&[
        "authentication failed",
        "could not read username",
        "could not read password",
        "permission denied",
        "error: 401",
        "error: 403",
    ]) {
        CloneFailureKind::Authentication
    } else if has(&["not found", "does not exist", "error: 404"]) {
        CloneFailureKind::NotFound
    } else if has(&[
        "could not resolve host",
        "connection refused",
        "connection timed out",
        "network is unreachable",
        "failed to connect",
        "early eof",
        "rpc failed",
        "unable to access",
    ]) {
        CloneFailureKind::Network
    } else {
        CloneFailureKind::Other
    }
}

/// Shallow, single-branch clone of `repo_url` into the empty directory `target`.
pub async fn shallow_clone(repo_url: &Url, target: &Path, depth: u32, token: Option<&str>, timeout: Duration) -> Result<(), CloneFailure> {
    let path_str = target
        .to_str()
        .ok_or_else(|| CloneFailure::new(CloneFailureKind::Other, "invalid UTF-8 in clone path"))?;

    let transport = transport_url(repo_url, token);
    let depth_arg = format!("--depth={depth}");

    let child = Command::new("git")
        .args(["clone", depth_arg.as_str(), "--single-branch", "--no-tags", "--quiet", transport.as_str(), path_str])
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GIT_LFS_SKIP_SMUDGE", "1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| CloneFailure::new(CloneFailureKind::Other, format!("could not spawn git: {e}")))?;

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Err(_) => Err(CloneFailure::new(
            CloneFailureKind::Timeout,
            format!("git clone of '{repo_url}' timed out after {} seconds", timeout.as_secs()),
        )),
        Ok(Err(e)) => Err(CloneFailure::new(CloneFailureKind::Other, format!("git clone failed to run: {e}"))),
        Ok(Ok(output)) if output.status.success() => Ok(()),
        Ok(Ok(output)) => {
            let stderr = redact(&String::from_utf8_lossy(&output.stderr), token);
            log::debug!(target: LOG_TARGET, "git clone of '{repo_url}' failed: {}", stderr.trim());
            Err(CloneFailure::new(classify_failure(&stderr), stderr.trim()))
        }
    }
}

fn check_git_output(output: &Output, operation: &str) -> Result<()> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("{operation} failed: {}", stderr.trim());
    }
    Ok(())
}

/// Author names of the most recent commits since `since`, newest first, at most `cap` of them.
///
/// Blocking; meant to run on the worker pool.
pub fn recent_authors(repo_path: &Path, since: DateTime<Utc>, cap: usize) -> Result<Vec<String>> {
    let since_arg = format!("--since={}", since.to_rfc3339());
    let max_count_arg = format!("--max-count={cap}");

    let output = std::process::Command::new("git")
        .arg("-C")
        .arg(repo_path)
        .args(["log", since_arg.as_str(), max_count_arg.as_str(), "--format=%aN"])
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .output()
        .into_app_err("could not run git log")?;

    check_git_output(&output, "git log")?;

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
