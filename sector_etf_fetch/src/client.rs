//! HTTP client for fund provider pages.

use std::time::Duration;

use reqwest::header::USER_AGENT;
use tokio::time::sleep;
use url::Url;

use crate::{user_agent::get_user_agent, Error};

/// Timeout, retry count, and retry spacing for [`PageClient`].
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Extra attempts after the first failure. `2` means up to three requests.
    pub retries: u32,
    /// Pause between attempts.
    pub retry_delay: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Fetches raw HTML pages.
///
/// Sends browser-like headers with a randomized user agent so provider sites
/// serve the same markup a browser would get. Transport errors and non-success
/// statuses are retried up to [`FetchOptions::retries`] times; the last error
/// is returned once attempts run out.
pub struct PageClient {
    http: reqwest::Client,
    options: FetchOptions,
}

impl PageClient {
    /// Creates a client with the default 30-second timeout and two retries.
    pub fn new() -> Result<Self, Error> {
        Self::with_options(FetchOptions::default())
    }

    pub fn with_options(options: FetchOptions) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .gzip(true)
            .build()?;
        Ok(Self { http, options })
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Fetches `url` and returns the response body as text.
    pub async fn fetch_html(&self, url: &str) -> Result<String, Error> {
        let parsed = Url::parse(url).map_err(|e| Error::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let attempts = self.options.retries + 1;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch_once(parsed.clone()).await {
                Ok(body) => {
                    tracing::debug!("Fetched {} ({} bytes, attempt {})", url, body.len(), attempt);
                    return Ok(body);
                }
                Err(err) if attempt < attempts => {
                    tracing::warn!(
                        "Fetch attempt {}/{} for {} failed: {}",
                        attempt,
                        attempts,
                        url,
                        err
                    );
                    if !self.options.retry_delay.is_zero() {
                        sleep(self.options.retry_delay).await;
                    }
                }
                Err(err) => {
                    tracing::error!("Giving up on {} after {} attempts: {}", url, attempts, err);
                    return Err(err);
                }
            }
        }
    }

    async fn fetch_once(&self, url: Url) -> Result<String, Error> {
        let resp = self
            .http
            .get(url)
            .header(USER_AGENT, get_user_agent())
            .header("accept", "text/html,application/xhtml+xml")
            .header("accept-language", "en-US,en;q=0.9")
            .header("cache-control", "no-cache")
            .header("pragma", "no-cache")
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...[truncated]", &body[..end])
}
