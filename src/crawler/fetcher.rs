//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for a harvest run, including:
//! - Building the single HTTP client (session) shared by the run
//! - GET requests for listing and product pages
//! - Retry with exponential backoff for transient failures
//! - Cancellation of in-flight requests and backoff sleeps
//! - Error classification

use crate::config::FetchConfig;
use crate::dom::Document;
use crate::{ExtractionError, FetchError, FetchResult, HarvestError};
use reqwest::{header::CONTENT_TYPE, Client};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// A successful response body, before parsing
#[derive(Debug)]
pub struct FetchedBody {
    /// Final URL after redirects
    pub url: Url,
    /// Content-Type header value, if the server sent one
    pub content_type: Option<String>,
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Backoff before retry number `attempt` (1-based): `base * 2^(attempt-1)`
///
/// Saturates instead of overflowing for large attempt counts.
pub fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(62);
    Duration::from_millis(base_ms.saturating_mul(2_u64.pow(exponent)))
}

/// The HTTP session of one harvest run
///
/// Owns the connection pool. Each run builds its own `Fetcher` and passes it
/// by reference to every step that needs the network; runs never share one.
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl Fetcher {
    /// Creates a fetcher from the fetch configuration
    pub fn new(config: &FetchConfig) -> FetchResult<Self> {
        let client = build_http_client(config).map_err(FetchError::Client)?;
        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        })
    }

    /// Fetches a page and parses it
    ///
    /// # Returns
    ///
    /// * `Ok(Document)` - The parsed page
    /// * `Err(HarvestError::Fetch)` - Network, timeout, status or cancellation failure
    /// * `Err(HarvestError::Extraction)` - The response is not HTML
    pub async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<Document, HarvestError> {
        let fetched = self.fetch_body(url, cancel).await?;

        if let Some(content_type) = &fetched.content_type {
            if !content_type.to_ascii_lowercase().contains("html") {
                return Err(ExtractionError::NotHtml {
                    url: fetched.url.to_string(),
                    content_type: content_type.clone(),
                }
                .into());
            }
        }

        Ok(Document::parse(fetched.url, &fetched.body))
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Return body |
    /// | HTTP 429, 5xx | Retry with backoff |
    /// | Timeout, connection error | Retry with backoff |
    /// | Other HTTP status | Fail immediately |
    /// | Cancellation | Fail immediately |
    pub async fn fetch_body(&self, url: &str, cancel: &CancellationToken) -> FetchResult<FetchedBody> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            match self.try_fetch(url, cancel).await {
                Ok(fetched) => return Ok(fetched),
                Err(e) if e.is_transient() && attempt <= self.max_retries => {
                    let delay = backoff_delay(self.retry_backoff_ms, attempt);
                    tracing::debug!(
                        "Attempt {} for {} failed ({}), retrying in {:?}",
                        attempt,
                        url,
                        e,
                        delay
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => {
                            return Err(FetchError::Cancelled { url: url.to_string() });
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// A single GET attempt
    async fn try_fetch(&self, url: &str, cancel: &CancellationToken) -> FetchResult<FetchedBody> {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled { url: url.to_string() });
        }

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(FetchError::Cancelled { url: url.to_string() });
            }
            result = self.client.get(url).send() => result.map_err(|e| classify_error(url, e))?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = tokio::select! {
            _ = cancel.cancelled() => {
                return Err(FetchError::Cancelled { url: url.to_string() });
            }
            result = response.text() => result.map_err(|e| classify_error(url, e))?,
        };

        Ok(FetchedBody {
            url: final_url,
            content_type,
            body,
        })
    }
}

/// Maps a reqwest error onto the fetch error taxonomy
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
