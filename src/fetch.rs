//! HTTP fetching of feed documents.
//!
//! The pipeline only sees the [`FeedFetcher`] trait, so it can run against
//! [`HttpFetcher`] in production and an in-memory fetcher in tests.
//!
//! # Behavior
//!
//! - One attempt per call; retries are the caller's business (there are none)
//! - Any HTTP status counts as a successful fetch; only transport failures
//!   (DNS, connect, TLS, timeout, truncated body) are [`FetchError`]s
//! - Every request carries the same browser-like `User-Agent` and `Accept`
//!   headers

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use std::error::Error;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
const FEED_ACCEPT: &str = "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.9, */*;q=0.8";

/// Status code and body of one HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Transport-level failure: no usable HTTP response was received.
#[derive(Debug)]
pub struct FetchError {
    pub url: String,
    pub timed_out: bool,
    message: String,
}

impl FetchError {
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timed_out: false,
            message: message.into(),
        }
    }

    pub fn timeout(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timed_out: true,
            message: "request timed out".to_string(),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fetching {} failed: {}", self.url, self.message)
    }
}

impl Error for FetchError {}

/// Source of raw feed bytes.
#[allow(async_fn_in_trait)]
pub trait FeedFetcher {
    /// Fetch `url` once.
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError>;
}

/// [`FeedFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with the feed headers and a per-request `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, Box<dyn Error>> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(FEED_ACCEPT));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl FeedFetcher for HttpFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        let t0 = Instant::now();
        let response = self.client.get(url).send().await.map_err(|e| to_fetch_error(url, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| to_fetch_error(url, e))?
            .to_vec();

        debug!(
            status,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched feed"
        );
        Ok(FetchResponse { status, body })
    }
}

fn to_fetch_error(url: &str, e: reqwest::Error) -> FetchError {
    warn!(%url, error = %e, "Feed request failed");
    if e.is_timeout() {
        FetchError::timeout(url)
    } else {
        FetchError::new(url, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_200_is_ok() {
        let ok = FetchResponse { status: 200, body: vec![] };
        let moved = FetchResponse { status: 301, body: vec![] };
        let broken = FetchResponse { status: 500, body: vec![] };
        assert!(ok.is_ok());
        assert!(!moved.is_ok());
        assert!(!broken.is_ok());
    }

    #[test]
    fn test_fetch_error_display() {
        let e = FetchError::new("https://example.com/rss", "dns error");
        assert_eq!(e.to_string(), "fetching https://example.com/rss failed: dns error");
        assert!(!e.timed_out);

        let t = FetchError::timeout("https://example.com/rss");
        assert!(t.timed_out);
        assert!(t.to_string().contains("timed out"));
    }

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::new(DEFAULT_TIMEOUT).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
        // Port 9 on localhost (discard) is closed on any sane test machine.
        let result = fetcher.fetch("http://127.0.0.1:9/feed.xml").await;
        assert!(result.is_err());
    }
}
