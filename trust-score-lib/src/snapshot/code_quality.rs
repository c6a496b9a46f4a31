//! In-process lint pass over Python sources.
//!
//! Applies a handful of pycodestyle checks that are cheap to detect line by line:
//!
//! - `E501` line longer than 79 characters
//! - `W191` indentation containing tabs
//! - `W291` trailing whitespace
//! - `E711`/`E712` comparison to `None`, `True`, or `False` with `==` or `!=`

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use walkdir::WalkDir;

const MAX_LINE_LENGTH: usize = 79;

/// Files larger than this are skipped; they are almost always generated.
const MAX_FILE_BYTES: u64 = 1024 * 1024;

const MAX_FILES: usize = 2_000;

static SINGLETON_COMPARISON: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[=!]=\s*(None|True|False)\b").expect("valid regex"));

/// Result of linting a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeQualityStats {
    pub files_checked: usize,
    pub lint_errors: usize,
    pub has_tests: bool,
}

impl CodeQualityStats {
    /// `1 - min(1, errors × 0.05)`.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "error counts are far below 2^52")]
    pub fn lint_score(&self) -> f64 {
        1.0 - (self.lint_errors as f64 * 0.05).min(1.0)
    }
}

/// Count lint errors in one Python source file.
#[must_use]
pub fn lint_source(source: &str) -> usize {
    source
        .lines()
        .map(|line| {
            let mut errors = 0;

            if line.chars().count() > MAX_LINE_LENGTH {
                errors += 1;
            }

            let indent_len = line.len() - line.trim_start().len();
            if line.get(..indent_len).is_some_and(|indent| indent.contains('\t')) {
                errors += 1;
            }

            if line.ends_with([' ', '\t']) {
                errors += 1;
            }

            let code = line.split('#').next().unwrap_or_default();
            errors += SINGLETON_COMPARISON.find_iter(code).count();

            errors
        })
        .sum()
}

fn is_python(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("py"))
}

/// Whether a file or directory name marks test code.
fn is_test_name(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    name.starts_with("test") || name.starts_with("spec")
}

/// Lint every Python file under `root` (skipping `.git`) and look for tests.
#[must_use]
pub fn analyze(root: &Path) -> CodeQualityStats {
    let mut stats = CodeQualityStats::default();

    for entry in WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git")
        .filter_map(Result::ok)
    {
        if !stats.has_tests && is_test_name(&entry.file_name().to_string_lossy()) {
            stats.has_tests = true;
        }

        if !entry.file_type().is_file() || !is_python(entry.path()) || stats.files_checked >= MAX_FILES {
            continue;
        }

        if entry.metadata().map_or(true, |m| m.len() > MAX_FILE_BYTES) {
            continue;
        }

        if let Ok(bytes) = std::fs::read(entry.path()) {
            stats.lint_errors += lint_source(&String::from_utf8_lossy(&bytes));
            stats.files_checked += 1;
        }
    }

    stats
}
