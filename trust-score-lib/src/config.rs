use crate::Result;
use crate::pipeline::PipelineSettings;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::TimeDelta;
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../default_config.toml");

/// File looked up in the working directory when no configuration path is given.
pub const DEFAULT_CONFIG_FILE: &str = "trust-score.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// How long a stored rating is reused; zero disables reuse
    #[serde(default = "default_rating_cache_ttl", with = "humantime_serde")]
    pub rating_cache_ttl: Duration,

    /// Upper bound on the time spent rating one entry
    #[serde(default = "default_time_budget", with = "humantime_serde")]
    pub time_budget: Duration,

    /// Upper bound on the time spent cloning one repository
    #[serde(default = "default_clone_timeout", with = "humantime_serde")]
    pub clone_timeout: Duration,

    /// Concurrent CPU-bound tasks; 0 means one per CPU
    #[serde(default)]
    pub worker_pool_size: usize,

    /// Commit history depth fetched when cloning
    #[serde(default = "default_clone_depth")]
    pub clone_depth: u32,

    /// Days of history considered for the bus factor
    #[serde(default = "default_commit_window_days")]
    pub commit_window_days: u32,

    /// Most commits considered for the bus factor
    #[serde(default = "default_max_commits")]
    pub max_commits: usize,

    /// Chat completions endpoint
    #[serde(default = "default_llm_endpoint")]
    pub llm_endpoint: String,

    /// Model requested from the chat completions endpoint
    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    /// Base URL of the Hugging Face Hub API
    #[serde(default = "default_hub_api_url")]
    pub hub_api_url: String,
}

const fn default_rating_cache_ttl() -> Duration {
    Duration::from_secs(30 * 60)
}

const fn default_time_budget() -> Duration {
    Duration::from_secs(60)
}

const fn default_clone_timeout() -> Duration {
    Duration::from_secs(45)
}

const fn default_clone_depth() -> u32 {
    100
}

const fn default_commit_window_days() -> u32 {
    365
}

const fn default_max_commits() -> usize {
    100
}

fn default_llm_endpoint() -> String {
    "https://genai.rcac.purdue.edu/api/chat/completions".to_string()
}

fn default_llm_model() -> String {
    "llama3.3:70b".to_string()
}

fn default_hub_api_url() -> String {
    "https://huggingface.co".to_string()
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `trust-score.toml` in `base_dir` is used when it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading trust-score configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
                Err(e) => return Err(e).into_app_err_with(|| format!("reading trust-score configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range or a URL does not parse
    pub fn validate(&self) -> Result<()> {
        if self.time_budget.is_zero() {
            return Err(app_err!("time_budget must be greater than zero"));
        }

        if self.clone_timeout.is_zero() {
            return Err(app_err!("clone_timeout must be greater than zero"));
        }

        if self.clone_depth == 0 {
            return Err(app_err!("clone_depth must be at least 1"));
        }

        if self.commit_window_days == 0 {
            return Err(app_err!("commit_window_days must be at least 1"));
        }

        if self.max_commits == 0 {
            return Err(app_err!("max_commits must be at least 1"));
        }

        for (key, value) in [("llm_endpoint", &self.llm_endpoint), ("hub_api_url", &self.hub_api_url)] {
            let _ = url::Url::parse(value).into_app_err_with(|| format!("{key} is not a valid URL: '{value}'"))?;
        }

        if self.llm_model.trim().is_empty() {
            return Err(app_err!("llm_model must not be empty"));
        }

        Ok(())
    }

    /// The per-entry pipeline settings this configuration describes.
    #[must_use]
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            time_budget: self.time_budget,
            commit_window: TimeDelta::days(i64::from(self.commit_window_days)),
            max_commits: self.max_commits,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
