//! Chat-completion client used to read READMEs.

use super::LOG_TARGET;
use super::resilient_http::{RetryPolicy, send_with_retry};
use crate::Result;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use ohno::{IntoAppError, bail};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

/// The answer given when no credential is configured, or after the service rejected it.
///
/// Evaluators parse this like any other answer; it carries no score.
pub const DEFAULT_CHAT_RESPONSE: &str = "No performance claims found in the documentation.";

/// A large language model that answers a single prompt.
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Answer `prompt`.
    ///
    /// Implementations without a credential return [`DEFAULT_CHAT_RESPONSE`] rather than an
    /// error. An error means the service itself could not be reached.
    fn chat<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>>;
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: [ChatMessage; 1],
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct GenAiClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    has_key: bool,
    key_rejected: AtomicBool,
    retry: RetryPolicy,
}

impl GenAiClient {
    /// Create a client. Without `api_key` no request is ever sent.
    pub fn new(api_key: Option<&str>, endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let api_key = api_key.map(str::trim).filter(|k| !k.is_empty());
        let mut builder = reqwest::Client::builder().user_agent("trust-score");

        if let Some(key) = api_key {
            let mut auth_val = HeaderValue::from_str(&format!("Bearer {key}"))?;
            auth_val.set_sensitive(true);

            let mut headers = HeaderMap::new();
            let _ = headers.insert(AUTHORIZATION, auth_val);
            builder = builder.default_headers(headers);
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: endpoint.into(),
            model: model.into(),
            has_key: api_key.is_some(),
            key_rejected: AtomicBool::new(false),
            retry: RetryPolicy::default(),
        })
    }

    /// Replace the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn key_usable(&self) -> bool {
        self.has_key && !self.key_rejected.load(Ordering::Acquire)
    }

    async fn chat_core(&self, prompt: &str) -> Result<String> {
        if !self.key_usable() {
            log::debug!(target: LOG_TARGET, "No usable LLM credential, using the default answer");
            return Ok(DEFAULT_CHAT_RESPONSE.to_string());
        }

        let request = ChatRequest {
            model: self.model.clone(),
            messages: [ChatMessage {
                role: "user",
                content: prompt.to_string(),
            }],
        };

        let endpoint = self.endpoint.clone();
        let resp = send_with_retry("LLM", self.retry, &self.client, request, move |client, request| {
            client.post(&endpoint).json(&request)
        })
        .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            log::warn!(target: LOG_TARGET, "LLM service rejected the credential; using default answers from now on");
            self.key_rejected.store(true, Ordering::Release);
            return Ok(DEFAULT_CHAT_RESPONSE.to_string());
        }

        if !status.is_success() {
            bail!("LLM request failed with HTTP {status}");
        }

        let body: ChatResponse = resp.json().await.into_app_err("decoding LLM response")?;
        let Some(choice) = body.choices.into_iter().next() else {
            bail!("LLM response contained no choices");
        };

        Ok(choice.message.content)
    }
}

impl fmt::Debug for GenAiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenAiClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("has_key", &self.has_key)
            .field("key_rejected", &self.key_rejected)
            .finish_non_exhaustive()
    }
}

impl LlmProvider for GenAiClient {
    fn chat<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String>> {
        self.chat_core(prompt).boxed()
    }
}
