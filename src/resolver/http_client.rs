//! Page fetch capability and its reqwest-backed implementation.
//!
//! Everything that talks to the network for page inspection goes through
//! [`PageFetcher`], so resolution logic can be exercised against canned pages.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{debug, warn};

use crate::download::{FailureType, RetryDecision, RetryPolicy};
use crate::user_agent;

use super::ResolveError;

/// Default connect timeout for page requests.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default whole-request timeout for page requests.
pub const DEFAULT_PAGE_TIMEOUT_SECS: u64 = 30;

/// Attempts per page before a transient failure becomes final.
const PAGE_FETCH_ATTEMPTS: u32 = 3;

/// Fetches a page document by URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Returns the page body.
    ///
    /// # Errors
    ///
    /// Returns a fetch-class [`ResolveError`] on network failure or
    /// non-success response.
    async fn fetch(&self, url: &str) -> Result<String, ResolveError>;
}

/// [`PageFetcher`] over HTTP with retry on transient failures.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    retry_policy: RetryPolicy,
}

impl HttpPageFetcher {
    /// Creates a fetcher with default timeouts and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Client`] when client construction fails.
    pub fn new() -> Result<Self, ResolveError> {
        Self::with_timeout(Duration::from_secs(DEFAULT_PAGE_TIMEOUT_SECS))
    }

    /// Creates a fetcher with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Client`] when client construction fails.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ResolveError> {
        Self::with_retry_policy(timeout, RetryPolicy::with_max_attempts(PAGE_FETCH_ATTEMPTS))
    }

    /// Creates a fetcher with a custom timeout and retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Client`] when client construction fails.
    pub fn with_retry_policy(
        timeout: Duration,
        retry_policy: RetryPolicy,
    ) -> Result<Self, ResolveError> {
        Ok(Self {
            client: build_page_client(timeout)?,
            retry_policy,
        })
    }

    async fn fetch_once(&self, url: &str) -> Result<String, ResolveError> {
        let response = self
            .client
            .get(url)
            .header(
                ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| ResolveError::fetch(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::http_status(url, status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| ResolveError::fetch(url, format!("could not read body: {e}")))
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    #[tracing::instrument(skip(self), fields(url = %url))]
    async fn fetch(&self, url: &str) -> Result<String, ResolveError> {
        let mut attempt = 1;
        loop {
            let error = match self.fetch_once(url).await {
                Ok(body) => {
                    debug!(attempt, bytes = body.len(), "page fetched");
                    return Ok(body);
                }
                Err(error) => error,
            };

            let failure_type = match &error {
                ResolveError::HttpStatus { status: 429, .. } => FailureType::RateLimited,
                e if e.is_transient() => FailureType::Transient,
                _ => FailureType::Permanent,
            };

            match self.retry_policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(
                        error = %error,
                        attempt,
                        delay_ms = delay.as_millis(),
                        "page fetch failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(error = %error, reason = %reason, "page fetch failed");
                    return Err(error);
                }
            }
        }
    }
}

fn build_page_client(timeout: Duration) -> Result<Client, ResolveError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS).min(timeout))
        .timeout(timeout)
        .user_agent(user_agent::default_user_agent())
        .gzip(true)
        .build()
        .map_err(|e| ResolveError::Client {
            reason: e.to_string(),
        })
}
