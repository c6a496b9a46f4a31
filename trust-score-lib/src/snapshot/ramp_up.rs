use std::path::Path;
use walkdir::WalkDir;

const EXAMPLE_DIRS: &[&str] = &["examples", "example", "notebooks", "demo", "demos", "tutorials"];
const DEPENDENCY_FILES: &[&str] = &[
    "requirements.txt",
    "pyproject.toml",
    "setup.py",
    "setup.cfg",
    "pipfile",
    "environment.yml",
    "environment.yaml",
];

/// How far below the root to look for example notebooks.
const NOTEBOOK_SEARCH_DEPTH: usize = 3;

/// Structural hints that a newcomer can get started quickly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RampUpSignals {
    pub has_examples: bool,
    pub has_dependencies: bool,
}

fn is_example_file(name: &str) -> bool {
    (name.starts_with("example") || name.starts_with("demo")) && name.ends_with(".py")
}

/// Inspect the top of the tree for examples and dependency manifests.
#[must_use]
pub fn analyze(root: &Path) -> RampUpSignals {
    let mut signals = RampUpSignals::default();

    if let Ok(entries) = std::fs::read_dir(root) {
        for entry in entries.filter_map(Result::ok) {
            let name = entry.file_name().to_string_lossy().to_ascii_lowercase();
            let is_dir = entry.file_type().is_ok_and(|t| t.is_dir());

            if (is_dir && EXAMPLE_DIRS.contains(&name.as_str())) || (!is_dir && is_example_file(&name)) {
                signals.has_examples = true;
            }

            if !is_dir && DEPENDENCY_FILES.contains(&name.as_str()) {
                signals.has_dependencies = true;
            }
        }
    }

    if !signals.has_examples {
        signals.has_examples = WalkDir::new(root)
            .max_depth(NOTEBOOK_SEARCH_DEPTH)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git")
            .filter_map(Result::ok)
            .any(|e| e.path().extension().is_some_and(|ext| ext.eq_ignore_ascii_case("ipynb")));
    }

    signals
}
