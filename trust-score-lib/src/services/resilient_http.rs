//! Retry and timeout handling for outbound HTTP calls.
//!
//! Requests run through a [`seatbelt`] retry layer over a timeout layer, so short outages of
//! the metadata or LLM service are masked and a hung connection counts as one failed attempt.

use crate::Result;
use core::time::Duration;
use layered::{Execute, Service, Stack};
use ohno::app_err;
use seatbelt::retry::{Backoff, Retry};
use seatbelt::timeout::Timeout;
use seatbelt::{RecoveryInfo, ResilienceContext};
use tick::Clock;

/// Default timeout for a single HTTP attempt.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Retries after the first attempt.
const MAX_RETRY_ATTEMPTS: u32 = 3;

/// Attempt `n` waits `n` times this long before going out.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Wait applied to a 429 that names no delay of its own.
const RATE_LIMIT_FALLBACK_DELAY: Duration = Duration::from_secs(5);

/// How hard to try before giving up on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRY_ATTEMPTS,
            base_delay: RETRY_BASE_DELAY,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// The delay a rate-limited response asks for, in whole seconds.
fn requested_delay(resp: &reqwest::Response) -> Option<Duration> {
    let value = resp.headers().get(reqwest::header::RETRY_AFTER)?.to_str().ok()?;
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Transport failures, 5xx and 429 are worth another attempt; every other status is final.
fn recovery_for(outcome: &Result<reqwest::Response>) -> RecoveryInfo {
    match outcome {
        Err(_) => RecoveryInfo::retry(),
        Ok(resp) if resp.status().is_server_error() => RecoveryInfo::retry(),
        Ok(resp) if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS => {
            RecoveryInfo::retry().delay(requested_delay(resp).unwrap_or(RATE_LIMIT_FALLBACK_DELAY))
        }
        Ok(_) => RecoveryInfo::never(),
    }
}

/// Send a request, retrying transient failures according to `policy`.
///
/// `build_request` turns a copy of `input` into a request on `client` once per attempt.
/// When retries run out the last outcome is returned as is, so callers still see the final
/// status code.
pub async fn send_with_retry<In, F>(
    name: &'static str,
    policy: RetryPolicy,
    client: &reqwest::Client,
    input: In,
    build_request: F,
) -> Result<reqwest::Response>
where
    In: Clone + Send + Sync + 'static,
    F: Fn(&reqwest::Client, In) -> reqwest::RequestBuilder + Send + Sync + 'static,
{
    let clock = Clock::new_tokio();
    let context = ResilienceContext::new(&clock).name(name);

    let client = client.clone();
    let service = (
        Retry::layer("retry", &context)
            .clone_input()
            .recovery_with(|outcome: &Result<reqwest::Response>, _| recovery_for(outcome))
            .max_retry_attempts(policy.max_retries)
            .base_delay(policy.base_delay)
            .backoff(Backoff::Linear)
            .on_retry(move |_output, args| {
                log::debug!(
                    "retrying {name} request (attempt {}, delay {}ms)",
                    args.attempt().index() + 1,
                    args.retry_delay().as_millis(),
                );
            }),
        Timeout::layer("timeout", &context)
            .timeout_error(move |_| app_err!("{name} request timed out after {} seconds", policy.timeout.as_secs()))
            .timeout(policy.timeout),
        Execute::new(move |input: In| {
            let request = build_request(&client, input);
            async move { request.send().await.map_err(ohno::AppError::from) }
        }),
    )
        .into_service();

    service.execute(input).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 2,
            base_delay: Duration::from_millis(1),
            timeout: Duration::from_secs(5),
        }
    }

    async fn get(policy: RetryPolicy, url: String) -> Result<reqwest::Response> {
        send_with_retry("test", policy, &reqwest::Client::new(), url, |client, url| client.get(url)).await
    }

    #[tokio::test]
    async fn test_success_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let resp = get(fast_policy(), format!("{}/ok", server.uri())).await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_server_errors_are_retried_until_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let resp = get(fast_policy(), format!("{}/flaky", server.uri())).await.unwrap();
        assert_eq!(resp.status(), 503);
    }

    #[tokio::test]
    async fn test_rate_limit_honors_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .expect(3)
            .mount(&server)
            .await;

        let resp = get(fast_policy(), format!("{}/busy", server.uri())).await.unwrap();
        assert_eq!(resp.status(), 429);
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let resp = get(fast_policy(), format!("{}/missing", server.uri())).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_slow_responses_time_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let policy = RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(1),
            timeout: Duration::from_millis(50),
        };

        let err = get(policy, format!("{}/slow", server.uri())).await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_connection_errors_surface_after_retries() {
        let result = get(fast_policy(), "http://127.0.0.1:9/unreachable".to_string()).await;
        assert!(result.is_err());
    }
}
