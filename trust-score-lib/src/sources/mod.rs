//! Entries, artifacts, and URL classification.
//!
//! An [`Entry`] is the caller-supplied `(code?, dataset?, model)` triple. The classifier
//! decides what each URL points at and which repository, if any, should be cloned for
//! analysis.

mod classifier;
mod entry;
mod url_file;

pub use classifier::{SourceKind, classify, hf_dataset_id, hf_model_id, is_cloneable, parse_url, select_primary_repo};
pub use entry::{Artifact, ArtifactCategory, Entry};
pub use url_file::parse_url_file;

const LOG_TARGET: &str = "   sources";
