use super::Host;
use super::common::{LogLevel, init_logging};
use crate::Result;
use crate::cache::{FileRatingStore, MemoryRatingStore, RatingCache, RatingStore};
use crate::config::Config;
use crate::pipeline::{Orchestrator, ScoringError, TrustScorer};
use crate::scheduler::WorkerPool;
use crate::services::{GenAiClient, HuggingFaceClient};
use crate::snapshot::GitCli;
use crate::sources::{Entry, parse_url_file};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use futures_util::future::join_all;
use ohno::{IntoAppError, app_err};
use std::fs;
use std::io::Write;
use std::sync::Arc;

#[derive(Parser, Debug)]
pub struct RateArgs {
    /// File listing the entries to rate, one URL or one `code,dataset,model` triple per line
    #[arg(value_name = "URL_FILE")]
    pub url_file: Utf8PathBuf,

    /// Path to configuration file (default is `trust-score.toml` in the current directory)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Directory where ratings are stored for reuse
    #[arg(long, value_name = "PATH")]
    pub cache_dir: Option<Utf8PathBuf>,

    /// Ignore stored ratings and do not store new ones
    #[arg(long)]
    pub no_cache: bool,

    /// GitHub personal access token
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// API key for the chat completions endpoint
    #[arg(long, value_name = "KEY", env = "GENAI_API_KEY", hide_env_values = true)]
    pub genai_api_key: Option<String>,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

pub async fn process_rate<H: Host>(host: &mut H, args: &RateArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    let text = fs::read_to_string(&args.url_file).into_app_err_with(|| format!("reading URL file '{}'", args.url_file))?;

    let entries = parse_url_file(&text);
    if entries.is_empty() {
        let _ = writeln!(host.error(), "No entries with a model URL found in '{}'", args.url_file);
        host.exit(1);
        return Ok(());
    }

    let scorer = Arc::new(build_scorer(&config, args)?);
    let total = entries.len();
    let failed = rate_entries(host, &scorer, entries).await?;

    if failed > 0 {
        let _ = writeln!(host.error(), "{failed} of {total} entries could not be rated");
        host.exit(1);
    }

    Ok(())
}

fn build_scorer(config: &Config, args: &RateArgs) -> Result<TrustScorer> {
    let git = Arc::new(GitCli::new(args.github_token.as_deref(), config.clone_depth, config.clone_timeout));
    let llm = Arc::new(GenAiClient::new(args.genai_api_key.as_deref(), config.llm_endpoint.as_str(), config.llm_model.as_str())?);
    let datasets = Arc::new(HuggingFaceClient::new(config.hub_api_url.as_str())?);
    let pool = WorkerPool::new(config.worker_pool_size);

    let store: Arc<dyn RatingStore> = if args.no_cache {
        Arc::new(MemoryRatingStore::new())
    } else {
        let dir = match &args.cache_dir {
            Some(dir) => dir.as_std_path().to_path_buf(),
            None => FileRatingStore::default_dir()?,
        };
        Arc::new(FileRatingStore::new(dir))
    };

    let orchestrator = Orchestrator::new(git, llm, datasets, pool, config.pipeline_settings());
    Ok(TrustScorer::new(orchestrator, RatingCache::new(store, config.rating_cache_ttl)))
}

/// Rate every entry on its own task and report the results in input order.
///
/// Ratings go to the host's output as one JSON record per line; failures go to its error
/// stream. Returns the number of entries that failed.
pub(crate) async fn rate_entries<H: Host>(host: &mut H, scorer: &Arc<TrustScorer>, entries: Vec<Entry>) -> Result<usize> {
    let tasks = entries.into_iter().map(|entry| {
        let scorer = Arc::clone(scorer);
        let model_url = entry.model_url().to_string();
        let handle = tokio::spawn(async move { scorer.score(entry).await });
        async move { (model_url, handle.await) }
    });

    let mut failed = 0;
    for (model_url, joined) in join_all(tasks).await {
        let outcome = joined.unwrap_or_else(|e| Err(ScoringError::Internal(app_err!("rating task failed: {e}"))));

        match outcome {
            Ok(rating) => {
                let line = serde_json::to_string(&rating.to_record()).into_app_err("serializing rating")?;
                let _ = writeln!(host.output(), "{line}");
            }
            Err(e) => {
                failed += 1;
                let _ = writeln!(host.error(), "{model_url}: [{}] {e}", e.code());
            }
        }
    }

    Ok(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;
    use crate::pipeline::PipelineSettings;
    use crate::services::{DEFAULT_CHAT_RESPONSE, DatasetInfo, DatasetMetadataProvider, LlmProvider};
    use crate::snapshot::{CloneFailure, CloneFailureKind, GitProvider, RepositorySnapshot};
    use core::time::Duration;
    use futures_util::FutureExt;
    use futures_util::future::BoxFuture;
    use url::Url;

    #[derive(Debug)]
    struct Unreachable {
        clone_delay: Duration,
    }

    impl GitProvider for Unreachable {
        fn clone_repository<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, core::result::Result<RepositorySnapshot, CloneFailure>> {
            async move {
                tokio::time::sleep(self.clone_delay).await;
                Err(CloneFailure::new(CloneFailureKind::Network, "offline"))
            }
            .boxed()
        }
    }

    impl LlmProvider for Unreachable {
        fn chat<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String>> {
            async { Ok(DEFAULT_CHAT_RESPONSE.to_string()) }.boxed()
        }
    }

    impl DatasetMetadataProvider for Unreachable {
        fn dataset_info<'a>(&'a self, _repo_id: &'a str) -> BoxFuture<'a, Result<Option<DatasetInfo>>> {
            async { Ok(None) }.boxed()
        }
    }

    fn offline_scorer(time_budget: Duration, clone_delay: Duration) -> Arc<TrustScorer> {
        let offline = Arc::new(Unreachable { clone_delay });
        let settings = PipelineSettings {
            time_budget,
            ..PipelineSettings::default()
        };

        let orchestrator = Orchestrator::new(
            Arc::clone(&offline) as Arc<dyn GitProvider>,
            Arc::clone(&offline) as Arc<dyn LlmProvider>,
            offline,
            WorkerPool::new(2),
            settings,
        );
        Arc::new(TrustScorer::new(
            orchestrator,
            RatingCache::new(Arc::new(MemoryRatingStore::new()), Duration::from_secs(60)),
        ))
    }

    #[tokio::test]
    async fn test_ratings_are_written_in_input_order() {
        let entries = vec![
            Entry::new(None, None, "https://huggingface.co/org/first").unwrap(),
            Entry::new(Some("https://github.com/org/code"), None, "https://huggingface.co/org/second").unwrap(),
            Entry::new(None, None, "https://huggingface.co/org/third").unwrap(),
        ];

        let mut host = TestHost::new();
        let failed = rate_entries(&mut host, &offline_scorer(Duration::from_secs(30), Duration::ZERO), entries).await.unwrap();
        assert_eq!(failed, 0);

        let names: Vec<String> = host
            .output_text()
            .lines()
            .map(|line| {
                let record: serde_json::Value = serde_json::from_str(line).unwrap();
                record["name"].as_str().unwrap().to_string()
            })
            .collect();

        assert_eq!(names, ["first", "second", "third"]);
        assert!(host.error_buf.is_empty());
    }

    #[tokio::test]
    async fn test_records_carry_scores_and_latencies() {
        let entries = vec![Entry::new(None, None, "https://huggingface.co/org/model").unwrap()];

        let mut host = TestHost::new();
        let _ = rate_entries(&mut host, &offline_scorer(Duration::from_secs(30), Duration::ZERO), entries).await.unwrap();

        let record: serde_json::Value = serde_json::from_str(host.output_text().trim()).unwrap();
        assert_eq!(record["category"], "MODEL");
        assert_eq!(record["reviewedness"], -1.0);
        assert!(record["net_score"].as_f64().unwrap() >= 0.0);
        assert!(record.get("net_score_latency").is_some());
        assert!(record.get("license_latency").is_some());
    }

    #[tokio::test]
    async fn test_timeouts_are_reported_on_stderr() {
        let entries = vec![Entry::new(None, None, "https://huggingface.co/org/model").unwrap()];

        let mut host = TestHost::new();
        let failed = rate_entries(&mut host, &offline_scorer(Duration::from_millis(50), Duration::from_secs(5)), entries).await.unwrap();

        assert_eq!(failed, 1);
        assert!(host.output_buf.is_empty());
        let errors = host.error_text();
        assert!(errors.contains("https://huggingface.co/org/model"));
        assert!(errors.contains("[timeout]"));
    }

    #[tokio::test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    async fn test_url_file_without_models() {
        let tmp = tempfile::tempdir().unwrap();
        let url_file = Utf8PathBuf::from_path_buf(tmp.path().join("urls.txt")).unwrap();
        fs::write(&url_file, "https://github.com/org/code\n\n# comment\n").unwrap();

        let args = RateArgs {
            url_file,
            config: None,
            cache_dir: None,
            no_cache: true,
            github_token: None,
            genai_api_key: None,
            log_level: LogLevel::None,
        };

        let mut host = TestHost::new();
        process_rate(&mut host, &args).await.unwrap();

        assert!(host.output_buf.is_empty());
        assert!(host.error_text().contains("No entries"));
        assert_eq!(host.exit_code, Some(1));
    }

    #[tokio::test]
    async fn test_missing_url_file() {
        let args = RateArgs {
            url_file: Utf8PathBuf::from("definitely/not/here.txt"),
            config: None,
            cache_dir: None,
            no_cache: true,
            github_token: None,
            genai_api_key: None,
            log_level: LogLevel::None,
        };

        let mut host = TestHost::new();
        assert!(process_rate(&mut host, &args).await.is_err());
    }
}
