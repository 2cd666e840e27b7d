//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the fixed request identity (headers, timeout)
//! - GET requests for listing pages, search results and item pages
//! - Error classification into timeout, network and HTTP status failures
//!
//! The fetcher never retries. A failed item is recorded as visited by the
//! coordinator and a rerun is the only recovery path.

use crate::config::ClientConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::fmt;
use std::time::Duration;

/// Why a fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The request did not complete within the configured timeout
    Timeout,

    /// Connection refused, DNS failure, TLS error, body read error
    Network,

    /// The origin answered with a non-2xx status
    HttpStatus(u16),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Network => write!(f, "network error"),
            Self::HttpStatus(code) => write!(f, "HTTP {}", code),
        }
    }
}

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub enum FetchResult {
    /// Successfully fetched the document
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Raw document bytes
        body: Vec<u8>,
    },

    /// The document could not be fetched
    Failure {
        /// Failure classification
        kind: FailureKind,
        /// Human readable description
        detail: String,
    },
}

impl FetchResult {
    /// Convenience constructor for failures
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            detail: detail.into(),
        }
    }
}

/// Capability to GET a document with a fixed request identity
///
/// Implementations must not retry internally.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url`, returning the body or a classified failure
    async fn fetch(&self, url: &str) -> FetchResult;
}

/// Builds an HTTP client with the configured identity
///
/// The user agent, `Accept` and `Accept-Language` headers are sent with every
/// request. Header values that are not valid HTTP header text are skipped with
/// a warning rather than failing the run.
///
/// # Example
///
/// ```no_run
/// use reel_crawl::config::ClientConfig;
/// use reel_crawl::crawler::build_http_client;
///
/// let client = build_http_client(&ClientConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    for (name, value) in [(ACCEPT, &config.accept), (ACCEPT_LANGUAGE, &config.accept_language)] {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(e) => tracing::warn!("Skipping invalid {} header: {}", name, e),
        }
    }

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_millis(config.timeout_ms))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`Fetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a freshly built client
    pub fn new(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult {
        fetch_url(&self.client, url).await
    }
}

/// Fetches a URL and classifies the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with readable body | `Success` |
/// | non-2xx status | `Failure(HttpStatus(code))` |
/// | timeout | `Failure(Timeout)` |
/// | connect error, body read error, other | `Failure(Network)` |
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if !status.is_success() {
                return FetchResult::failure(
                    FailureKind::HttpStatus(status.as_u16()),
                    format!("{} answered {}", final_url, status),
                );
            }

            match response.bytes().await {
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    body: body.to_vec(),
                },
                Err(e) if e.is_timeout() => {
                    FetchResult::failure(FailureKind::Timeout, "Timed out reading body")
                }
                Err(e) => FetchResult::failure(FailureKind::Network, e.to_string()),
            }
        }
        Err(e) => {
            if e.is_timeout() {
                FetchResult::failure(FailureKind::Timeout, "Request timeout")
            } else if e.is_connect() {
                FetchResult::failure(FailureKind::Network, format!("Connection failed: {}", e))
            } else {
                FetchResult::failure(FailureKind::Network, e.to_string())
            }
        }
    }
}
