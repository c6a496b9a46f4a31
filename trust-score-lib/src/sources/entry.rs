use super::classifier::{hf_model_id, parse_url};
use crate::pipeline::ScoringError;
use serde::{Deserialize, Serialize};
use strum::Display;

/// One unit of work: a model plus the code and dataset that go with it.
///
/// Only the model URL is mandatory. Blank optional URLs are normalized to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawEntry")]
pub struct Entry {
    code_url: Option<String>,
    dataset_url: Option<String>,
    model_url: String,
}

/// Wire form of an [`Entry`], accepting the field names older clients send.
#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default, alias = "code", alias = "code_link")]
    code_url: Option<String>,

    #[serde(default, alias = "dataset", alias = "dataset_link")]
    dataset_url: Option<String>,

    #[serde(default, alias = "model", alias = "model_link")]
    model_url: Option<String>,
}

impl TryFrom<RawEntry> for Entry {
    type Error = ScoringError;

    fn try_from(raw: RawEntry) -> Result<Self, Self::Error> {
        Self::new(raw.code_url.as_deref(), raw.dataset_url.as_deref(), raw.model_url.as_deref().unwrap_or_default())
    }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

impl Entry {
    /// Build an entry, failing when the model URL is missing or blank.
    pub fn new(code_url: Option<&str>, dataset_url: Option<&str>, model_url: &str) -> Result<Self, ScoringError> {
        let model_url = non_blank(Some(model_url)).ok_or(ScoringError::MissingModelUrl)?;

        Ok(Self {
            code_url: non_blank(code_url),
            dataset_url: non_blank(dataset_url),
            model_url,
        })
    }

    #[must_use]
    pub fn code_url(&self) -> Option<&str> {
        self.code_url.as_deref()
    }

    #[must_use]
    pub fn dataset_url(&self) -> Option<&str> {
        self.dataset_url.as_deref()
    }

    #[must_use]
    pub fn model_url(&self) -> &str {
        &self.model_url
    }
}

/// The category reported in a rating summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ArtifactCategory {
    Model,
    Dataset,
    Code,
}

/// An entry together with the identity under which its rating is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    id: String,
    name: String,
    category: ArtifactCategory,
    entry: Entry,
}

impl Artifact {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: ArtifactCategory, entry: Entry) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            entry,
        }
    }

    /// Derive a model artifact from an entry.
    ///
    /// The id is the Hugging Face model id when the model URL has one, otherwise the URL
    /// itself without a trailing slash. The name is the last path segment.
    #[must_use]
    pub fn from_entry(entry: Entry) -> Self {
        let model_url = entry.model_url().trim_end_matches('/');
        let id = hf_model_id(model_url).unwrap_or_else(|| model_url.to_string());

        let name = parse_url(model_url)
            .and_then(|url| url.path_segments().and_then(|mut s| s.rfind(|p| !p.is_empty()).map(str::to_string)))
            .or_else(|| model_url.rsplit('/').next().map(str::to_string))
            .unwrap_or_default();

        Self::new(id, name, ArtifactCategory::Model, entry)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn category(&self) -> ArtifactCategory {
        self.category
    }

    #[must_use]
    pub const fn entry(&self) -> &Entry {
        &self.entry
    }
}
