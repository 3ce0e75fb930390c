//! Upstream client for the Canvas LMS REST API
//!
//! All gateway endpoints funnel through [`CanvasClient::get`], which builds
//! `{institute_url}/api/v1/{endpoint}` requests with per-request bearer
//! credentials, decodes the JSON body, and retries transient failures
//! (429, 5xx, transport errors) with capped exponential backoff.

use crate::canvas::types::{Assignment, Course};
use crate::core::config::CanvasConfig;
use crate::core::error::{CanvasError, Error, Result};
use crate::system::metrics::{Metrics, Timer};
use reqwest::header::{HeaderValue, RETRY_AFTER};
use reqwest::Url;
use serde_json::Value;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Maximum number of response-body characters carried into error messages
const DETAIL_CHARS: usize = 160;

/// Shared client for talking to Canvas instances.
///
/// Credentials are per-request: the gateway itself is stateless and can
/// serve any number of institutions with one client.
#[derive(Clone)]
pub struct CanvasClient {
    http: reqwest::Client,
    retry_attempts: u32,
    base_backoff: Duration,
    max_backoff: Duration,
}

impl CanvasClient {
    /// Build a client from the upstream configuration
    pub fn new(config: &CanvasConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            retry_attempts: config.retry_attempts,
            base_backoff: config.retry_base_backoff(),
            max_backoff: config.retry_max_backoff(),
        })
    }

    /// Perform a GET against `{institute_url}/api/v1/{endpoint}` and decode
    /// the JSON response body.
    ///
    /// Query pairs are forwarded verbatim; repeated keys are preserved, which
    /// is how Canvas expects list-valued parameters such as `include`.
    pub async fn get(
        &self,
        institute_url: &str,
        token: &str,
        endpoint: &str,
        query: &[(String, String)],
    ) -> std::result::Result<Value, CanvasError> {
        let url = endpoint_url(institute_url, endpoint)?;

        let metrics = Metrics::global();
        metrics.upstream.requests.inc();
        let timer = Timer::start(metrics.upstream.request_duration.clone());

        let result = self.get_with_retries(url, token, query, endpoint).await;

        timer.finish();
        if result.is_err() {
            metrics.upstream.failures.inc();
        }
        result
    }

    /// Fetch the caller's courses, decoded into [`Course`] records
    pub async fn list_courses(
        &self,
        institute_url: &str,
        token: &str,
        enrollment_state: &str,
    ) -> std::result::Result<Vec<Course>, CanvasError> {
        let query = [("enrollment_state".to_string(), enrollment_state.to_string())];
        let data = self.get(institute_url, token, "courses", &query).await?;
        serde_json::from_value(data).map_err(|e| CanvasError::Decode(e.to_string()))
    }

    /// Fetch a course's assignments with submissions attached
    pub async fn course_assignments_with_submissions(
        &self,
        institute_url: &str,
        token: &str,
        course_id: i64,
    ) -> std::result::Result<Vec<Assignment>, CanvasError> {
        let endpoint = format!("courses/{}/assignments", course_id);
        let query = [("include".to_string(), "submission".to_string())];
        let data = self.get(institute_url, token, &endpoint, &query).await?;
        serde_json::from_value(data).map_err(|e| CanvasError::Decode(e.to_string()))
    }

    /// Retry loop: transport errors, 429, and 5xx are retried with backoff
    /// until the attempt budget runs out; other failures return immediately.
    async fn get_with_retries(
        &self,
        url: Url,
        token: &str,
        query: &[(String, String)],
        endpoint: &str,
    ) -> std::result::Result<Value, CanvasError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let mut request = self.http.get(url.clone()).bearer_auth(token);
            if !query.is_empty() {
                request = request.query(query);
            }

            let response = match request.send().await {
                Ok(r) => r,
                Err(e) => {
                    let err = CanvasError::from(e);
                    if err.is_retryable() && attempt < self.retry_attempts {
                        let delay = self.retry_delay(attempt, None);
                        debug!(
                            "Canvas send error for '{}' (attempt {}): {}; retrying in {:?}",
                            endpoint, attempt, err, delay
                        );
                        Metrics::global().upstream.retries.inc();
                        sleep(delay).await;
                        continue;
                    }
                    return Err(self.exhausted_or(err, attempt));
                }
            };

            let status = response.status();
            if !status.is_success() {
                let retry_after = response.headers().get(RETRY_AFTER).cloned();
                let body = response.text().await.unwrap_or_default();
                let err = CanvasError::Status {
                    status: status.as_u16(),
                    detail: snippet(&body),
                };

                if err.is_retryable() && attempt < self.retry_attempts {
                    let delay = self.retry_delay(attempt, retry_after.as_ref());
                    debug!(
                        "Canvas HTTP {} for '{}' (attempt {}); retrying in {:?}",
                        status.as_u16(),
                        endpoint,
                        attempt,
                        delay
                    );
                    Metrics::global().upstream.retries.inc();
                    sleep(delay).await;
                    continue;
                }
                return Err(self.exhausted_or(err, attempt));
            }

            return response
                .json::<Value>()
                .await
                .map_err(|e| CanvasError::Decode(e.to_string()));
        }
    }

    /// Wrap a final retryable error once the budget is spent; a request that
    /// never warranted a retry keeps its original error.
    fn exhausted_or(&self, err: CanvasError, attempts: u32) -> CanvasError {
        if err.is_retryable() && attempts >= self.retry_attempts && self.retry_attempts > 1 {
            CanvasError::RetriesExhausted {
                attempts,
                last: err.to_string(),
            }
        } else {
            err
        }
    }

    /// Delay before the next attempt: a usable `Retry-After` header wins,
    /// otherwise exponential backoff from the base delay. Both are capped
    /// at the configured maximum.
    fn retry_delay(&self, attempt: u32, retry_after: Option<&HeaderValue>) -> Duration {
        if let Some(delay) = retry_after
            .and_then(|h| h.to_str().ok())
            .and_then(parse_retry_after)
        {
            return delay.min(self.max_backoff);
        }

        let base_ms = self.base_backoff.as_millis() as u64;
        let exponent = attempt.saturating_sub(1).min(16);
        let ms = base_ms
            .saturating_mul(1u64 << exponent)
            .min(self.max_backoff.as_millis() as u64);
        Duration::from_millis(ms)
    }
}

/// Parse a `Retry-After` value, either delta-seconds or an HTTP-date.
/// Dates already in the past yield nothing and the caller falls back
/// to exponential backoff.
fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let when = chrono::DateTime::parse_from_rfc2822(value).ok()?;
    when.signed_duration_since(chrono::Utc::now()).to_std().ok()
}

/// Join an institute URL and relative endpoint into a full request URL.
/// Tolerates a trailing slash on the institute URL.
fn endpoint_url(institute_url: &str, endpoint: &str) -> std::result::Result<Url, CanvasError> {
    let base = institute_url.trim_end_matches('/');
    let raw = format!("{}/api/v1/{}", base, endpoint);
    Url::parse(&raw).map_err(|_| CanvasError::InvalidBaseUrl(institute_url.to_string()))
}

/// Truncate a response body into a single-line excerpt for error messages
fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    let cut: String = trimmed.chars().take(DETAIL_CHARS).collect();
    cut.replace('\n', "\\n").replace('\r', "\\r")
}
