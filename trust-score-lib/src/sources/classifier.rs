use super::Entry;
use strum::Display;
use url::Url;

const HUGGING_FACE_HOST: &str = "huggingface.co";
const CODE_HOSTS: &[&str] = &["github.com", "gitlab.com"];
const DATASET_HOSTS: &[&str] = &["image-net.org", "kaggle.com", "archive.ics.uci.edu"];

/// Path segments after a Hugging Face repository id that select a view rather than a repository.
const HF_VIEW_SEGMENTS: &[&str] = &["tree", "blob", "resolve", "commit", "discussions"];

/// What kind of source a URL refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SourceKind {
    Code,
    Dataset,
    Model,
    Unknown,
}

/// Parse a user-supplied URL, accepting bare `host/path` forms.
#[must_use]
pub fn parse_url(raw: &str) -> Option<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let url = Url::parse(raw).or_else(|_| Url::parse(&format!("https://{raw}"))).ok()?;
    if matches!(url.scheme(), "http" | "https") && url.host_str().is_some() {
        Some(url)
    } else {
        None
    }
}

fn host_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
    if let Some(stripped) = host.strip_prefix("www.") {
        return stripped.to_string();
    }

    host
}

fn segments(url: &Url) -> Vec<&str> {
    url.path_segments().map(|s| s.filter(|p| !p.is_empty()).collect()).unwrap_or_default()
}

fn host_matches(host: &str, candidates: &[&str]) -> bool {
    candidates
        .iter()
        .any(|c| host == *c || host.strip_suffix(c).is_some_and(|prefix| prefix.ends_with('.')))
}

/// Classify a URL by host and path.
///
/// Repositories on code hosts stay code even when their path mentions `datasets`; on
/// other hosts a `datasets` segment marks a dataset. Any other well-formed web URL is
/// treated as a model reference.
#[must_use]
pub fn classify(raw: &str) -> SourceKind {
    let Some(url) = parse_url(raw) else {
        return SourceKind::Unknown;
    };

    classify_url(&url)
}

fn classify_url(url: &Url) -> SourceKind {
    let host = host_of(url);
    let segs = segments(url);

    if host_matches(&host, DATASET_HOSTS) {
        return SourceKind::Dataset;
    }

    if host == HUGGING_FACE_HOST {
        return match segs.first() {
            Some(&"datasets") => SourceKind::Dataset,
            Some(&"spaces") => SourceKind::Code,
            _ => SourceKind::Model,
        };
    }

    if host_matches(&host, CODE_HOSTS) {
        return SourceKind::Code;
    }

    if segs.contains(&"datasets") {
        return SourceKind::Dataset;
    }

    SourceKind::Model
}

/// Whether a URL names a repository that can be cloned with git.
///
/// Code hosts need an `owner/repo` path. Hugging Face model and space repositories are git
/// repositories too; datasets are never cloned.
#[must_use]
pub fn is_cloneable(url: &Url) -> bool {
    let host = host_of(url);
    let segs = segments(url);

    match classify_url(url) {
        SourceKind::Code if host == HUGGING_FACE_HOST => segs.len() >= 3,
        SourceKind::Code => segs.len() >= 2,
        SourceKind::Model => host == HUGGING_FACE_HOST && hf_model_id(url.as_str()).is_some(),
        SourceKind::Dataset | SourceKind::Unknown => false,
    }
}

/// Pick the repository to clone for an entry.
///
/// An explicit code URL wins when it is cloneable; otherwise the model URL is used when it
/// is a cloneable, non-dataset repository. Returns `None` when nothing should be cloned.
#[must_use]
pub fn select_primary_repo(entry: &Entry) -> Option<Url> {
    entry
        .code_url()
        .and_then(parse_url)
        .filter(is_cloneable)
        .or_else(|| parse_url(entry.model_url()).filter(is_cloneable))
}

fn hf_repo_id(segs: &[&str]) -> Option<String> {
    let id: Vec<&str> = segs
        .iter()
        .copied()
        .take(2)
        .take_while(|s| !HF_VIEW_SEGMENTS.contains(s))
        .collect();

    if id.is_empty() { None } else { Some(id.join("/")) }
}

/// Extract the `owner/name` id of a Hugging Face dataset URL.
#[must_use]
pub fn hf_dataset_id(raw: &str) -> Option<String> {
    let url = parse_url(raw)?;
    if host_of(&url) != HUGGING_FACE_HOST {
        return None;
    }

    match segments(&url).split_first() {
        Some((&"datasets", rest)) => hf_repo_id(rest),
        _ => None,
    }
}

/// Extract the `owner/name` id of a Hugging Face model URL.
#[must_use]
pub fn hf_model_id(raw: &str) -> Option<String> {
    let url = parse_url(raw)?;
    if host_of(&url) != HUGGING_FACE_HOST {
        return None;
    }

    let segs = segments(&url);
    match segs.first() {
        None | Some(&("datasets" | "spaces" | "api" | "docs" | "models")) => None,
        Some(_) => hf_repo_id(&segs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_datasets() {
        assert_eq!(classify("https://huggingface.co/datasets/bookcorpus/bookcorpus"), SourceKind::Dataset);
        assert_eq!(classify("https://www.image-net.org/download"), SourceKind::Dataset);
        assert_eq!(classify("https://www.kaggle.com/c/titanic"), SourceKind::Dataset);
        assert_eq!(classify("https://archive.ics.uci.edu/ml/index.php"), SourceKind::Dataset);
        assert_eq!(classify("https://example.org/datasets/foo"), SourceKind::Dataset);
    }

    #[test]
    fn test_classify_code() {
        assert_eq!(classify("https://github.com/google-research/bert"), SourceKind::Code);
        assert_eq!(classify("https://gitlab.com/group/project"), SourceKind::Code);
        assert_eq!(classify("https://huggingface.co/spaces/owner/demo"), SourceKind::Code);
    }

    #[test]
    fn test_classify_models_and_unknown() {
        assert_eq!(classify("https://huggingface.co/google-bert/bert-base-uncased"), SourceKind::Model);
        assert_eq!(classify("huggingface.co/openai/whisper-tiny"), SourceKind::Model);
        assert_eq!(classify(""), SourceKind::Unknown);
        assert_eq!(classify("ftp://example.com/file"), SourceKind::Unknown);
        assert_eq!(classify("not a url at all"), SourceKind::Unknown);
    }

    #[test]
    fn test_is_cloneable() {
        let cloneable = |s: &str| is_cloneable(&parse_url(s).unwrap());

        assert!(cloneable("https://github.com/owner/repo"));
        assert!(cloneable("https://github.com/owner/repo/tree/main"));
        assert!(!cloneable("https://github.com/owner"));
        assert!(cloneable("https://huggingface.co/google-bert/bert-base-uncased"));
        assert!(cloneable("https://huggingface.co/spaces/owner/demo"));
        assert!(!cloneable("https://huggingface.co/datasets/owner/data"));
        assert!(!cloneable("https://example.com/some/model"));
    }

    #[test]
    fn test_select_primary_repo_prefers_code() {
        let entry = Entry::new(
            Some("https://github.com/owner/repo"),
            None,
            "https://huggingface.co/owner/model",
        )
        .unwrap();
        assert_eq!(select_primary_repo(&entry).unwrap().as_str(), "https://github.com/owner/repo");
    }

    #[test]
    fn test_code_repos_named_datasets_stay_code() {
        assert_eq!(classify("https://github.com/huggingface/datasets"), SourceKind::Code);
        assert_eq!(classify("https://gitlab.com/group/datasets/tree/main"), SourceKind::Code);
        assert!(is_cloneable(&parse_url("https://github.com/huggingface/datasets").unwrap()));

        let entry = Entry::new(
            Some("https://github.com/huggingface/datasets"),
            None,
            "https://huggingface.co/owner/model",
        )
        .unwrap();
        assert_eq!(select_primary_repo(&entry).unwrap().as_str(), "https://github.com/huggingface/datasets");
    }

    #[test]
    fn test_hugging_face_repos_named_datasets_are_models() {
        assert_eq!(classify("https://huggingface.co/owner/datasets"), SourceKind::Model);
        assert_eq!(classify("https://huggingface.co/datasets/owner/data"), SourceKind::Dataset);
    }

    #[test]
    fn test_select_primary_repo_falls_back_to_model() {
        let entry = Entry::new(
            Some("https://example.com/not-a-repo"),
            None,
            "https://huggingface.co/owner/model",
        )
        .unwrap();
        assert_eq!(select_primary_repo(&entry).unwrap().as_str(), "https://huggingface.co/owner/model");
    }

    #[test]
    fn test_select_primary_repo_none() {
        let entry = Entry::new(None, None, "https://huggingface.co/datasets/owner/data").unwrap();
        assert!(select_primary_repo(&entry).is_none());

        let entry = Entry::new(None, None, "https://example.com/model").unwrap();
        assert!(select_primary_repo(&entry).is_none());
    }

    #[test]
    fn test_select_primary_repo_is_deterministic() {
        let entry = Entry::new(
            Some("https://gitlab.com/group/project"),
            Some("https://huggingface.co/datasets/squad"),
            "https://huggingface.co/owner/model",
        )
        .unwrap();
        assert_eq!(select_primary_repo(&entry), select_primary_repo(&entry.clone()));
    }

    #[test]
    fn test_hf_dataset_id() {
        assert_eq!(hf_dataset_id("https://huggingface.co/datasets/bookcorpus/bookcorpus").as_deref(), Some("bookcorpus/bookcorpus"));
        assert_eq!(hf_dataset_id("https://huggingface.co/datasets/squad").as_deref(), Some("squad"));
        assert_eq!(hf_dataset_id("https://huggingface.co/datasets/squad/tree/main").as_deref(), Some("squad"));
        assert_eq!(hf_dataset_id("https://huggingface.co/datasets/o/n?x=1#frag").as_deref(), Some("o/n"));
        assert_eq!(hf_dataset_id("https://huggingface.co/owner/model"), None);
        assert_eq!(hf_dataset_id("https://www.kaggle.com/datasets/foo"), None);
    }

    #[test]
    fn test_hf_model_id() {
        assert_eq!(hf_model_id("https://huggingface.co/google-bert/bert-base-uncased").as_deref(), Some("google-bert/bert-base-uncased"));
        assert_eq!(hf_model_id("https://huggingface.co/owner/model/tree/main").as_deref(), Some("owner/model"));
        assert_eq!(hf_model_id("https://huggingface.co/gpt2").as_deref(), Some("gpt2"));
        assert_eq!(hf_model_id("https://huggingface.co/datasets/x/y"), None);
        assert_eq!(hf_model_id("https://huggingface.co/spaces/x/y"), None);
        assert_eq!(hf_model_id("https://github.com/x/y"), None);
    }
}
