//! Dataset popularity lookups against the Hugging Face Hub API.

use super::LOG_TARGET;
use super::resilient_http::{RetryPolicy, send_with_retry};
use crate::Result;
use core::fmt;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use ohno::{IntoAppError, bail};
use serde::Deserialize;

/// Popularity figures for one dataset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetInfo {
    pub likes: u64,
    pub downloads: u64,
}

/// A source of dataset metadata keyed by Hugging Face repository id.
pub trait DatasetMetadataProvider: Send + Sync + fmt::Debug {
    /// Look up a dataset. `Ok(None)` means the service answered that it does not exist.
    fn dataset_info<'a>(&'a self, repo_id: &'a str) -> BoxFuture<'a, Result<Option<DatasetInfo>>>;
}

/// The subset of the Hub's dataset document that we read. Counts may be absent or null.
#[derive(Debug, Deserialize)]
struct HubDataset {
    #[serde(default)]
    likes: Option<u64>,
    #[serde(default)]
    downloads: Option<u64>,
}

/// Client for `GET <base>/api/datasets/<id>`.
#[derive(Debug, Clone)]
pub struct HuggingFaceClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl HuggingFaceClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().user_agent("trust-score").build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Get the base URL for this client
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn dataset_info_core(&self, repo_id: &str) -> Result<Option<DatasetInfo>> {
        let url = format!("{}/api/datasets/{repo_id}", self.base_url);
        log::debug!(target: LOG_TARGET, "Fetching dataset metadata from '{url}'");

        let resp = send_with_retry("dataset metadata", self.retry, &self.client, url, |client, url| client.get(url)).await?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            log::info!(target: LOG_TARGET, "Dataset '{repo_id}' not found");
            return Ok(None);
        }

        if !status.is_success() {
            bail!("dataset metadata request for '{repo_id}' failed with HTTP {status}");
        }

        let doc: HubDataset = resp
            .json()
            .await
            .into_app_err_with(|| format!("decoding dataset metadata for '{repo_id}'"))?;

        Ok(Some(DatasetInfo {
            likes: doc.likes.unwrap_or(0),
            downloads: doc.downloads.unwrap_or(0),
        }))
    }
}

impl DatasetMetadataProvider for HuggingFaceClient {
    fn dataset_info<'a>(&'a self, repo_id: &'a str) -> BoxFuture<'a, Result<Option<DatasetInfo>>> {
        self.dataset_info_core(repo_id).boxed()
    }
}
