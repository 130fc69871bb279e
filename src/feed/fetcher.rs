use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

use crate::feed::parser::{parse_feed, ParsedFeed};

/// Value of the `User-Agent` header on every feed request.
pub const USER_AGENT: &str = concat!("news-fetcher/", env!("CARGO_PKG_VERSION"));

const DEFAULT_MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can end a feed fetch.
///
/// Everything except [`FetchError::Parse`] is a network failure. Only
/// timeouts and connection failures are retried; they surface here once
/// every attempt has been used.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Every attempt timed out
    #[error("Timeout after {attempts} attempts")]
    Timeout { attempts: u32 },
    /// Every attempt failed to connect
    #[error("Connection failed after {attempts} attempts: {detail}")]
    Connection { attempts: u32, detail: String },
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Any other transport failure (TLS, redirect loop, body decode, ...)
    #[error("Request error: {0}")]
    Request(#[source] reqwest::Error),
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Body was not a readable RSS or Atom document
    #[error("Feed parsing error: {0}")]
    Parse(String),
}

impl FetchError {
    pub fn is_network(&self) -> bool {
        !self.is_parse()
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, FetchError::Parse(_))
    }

    /// Number of attempts made before giving up, for retried failures.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            FetchError::Timeout { attempts } | FetchError::Connection { attempts, .. } => {
                Some(*attempts)
            }
            _ => None,
        }
    }
}

/// Knobs for [`FeedFetcher`].
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// Bound on one attempt, request and body together.
    pub timeout: Duration,
    /// Total attempts, including the first. Zero is treated as one.
    pub max_retries: u32,
    /// Pause between a retryable failure and the next attempt.
    pub retry_delay: Duration,
    /// Largest response body accepted.
    pub max_body_bytes: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 3,
            retry_delay: Duration::from_secs(5),
            max_body_bytes: DEFAULT_MAX_FEED_SIZE,
        }
    }
}

/// Why a single attempt failed.
enum AttemptFailure {
    Timeout,
    Connection(reqwest::Error),
    Fatal(FetchError),
}

impl From<reqwest::Error> for AttemptFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AttemptFailure::Timeout
        } else if err.is_connect() {
            AttemptFailure::Connection(err)
        } else {
            AttemptFailure::Fatal(FetchError::Request(err))
        }
    }
}

/// Retrieves and parses feeds with bounded retries.
pub struct FeedFetcher {
    client: reqwest::Client,
    settings: FetchSettings,
}

impl FeedFetcher {
    /// Builds a fetcher with its own HTTP client.
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(FetchError::Request)?;
        Ok(Self::with_client(client, settings))
    }

    /// Uses a caller-supplied client.
    pub fn with_client(client: reqwest::Client, settings: FetchSettings) -> Self {
        Self { client, settings }
    }

    /// Fetches and parses the feed at `url`.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Timeout`] / [`FetchError::Connection`] once every
    ///   attempt failed that way, waiting `retry_delay` between attempts
    /// - [`FetchError::HttpStatus`], [`FetchError::Request`],
    ///   [`FetchError::ResponseTooLarge`] on the first occurrence
    /// - [`FetchError::Parse`] when the body is not RSS/Atom; a malformed
    ///   document is not retried
    pub async fn fetch(&self, url: &str) -> Result<ParsedFeed, FetchError> {
        let max_attempts = self.settings.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(url = %url, attempt = attempt, max = max_attempts, "Fetching feed");

            match self.attempt(url).await {
                Ok(bytes) => {
                    let feed = parse_feed(&bytes).map_err(|e| {
                        tracing::warn!(url = %url, error = %e, "Feed parsing error");
                        FetchError::Parse(e.to_string())
                    })?;
                    tracing::debug!(url = %url, entries = feed.entries.len(), "Fetched feed");
                    return Ok(feed);
                }
                Err(AttemptFailure::Fatal(e)) => {
                    tracing::error!(url = %url, error = %e, "Feed request failed");
                    return Err(e);
                }
                Err(AttemptFailure::Timeout) => {
                    tracing::warn!(url = %url, attempt = attempt, "Timeout fetching feed");
                    if attempt >= max_attempts {
                        return Err(FetchError::Timeout {
                            attempts: max_attempts,
                        });
                    }
                }
                Err(AttemptFailure::Connection(e)) => {
                    tracing::warn!(url = %url, attempt = attempt, error = %e, "Connection error");
                    if attempt >= max_attempts {
                        return Err(FetchError::Connection {
                            attempts: max_attempts,
                            detail: e.to_string(),
                        });
                    }
                }
            }

            tokio::time::sleep(self.settings.retry_delay).await;
        }
    }

    async fn attempt(&self, url: &str) -> Result<Vec<u8>, AttemptFailure> {
        tokio::time::timeout(self.settings.timeout, self.download(url))
            .await
            .map_err(|_| AttemptFailure::Timeout)?
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, AttemptFailure> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AttemptFailure::Fatal(FetchError::HttpStatus(
                response.status().as_u16(),
            )));
        }

        read_limited_bytes(response, self.settings.max_body_bytes).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, AttemptFailure> {
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(AttemptFailure::Fatal(FetchError::ResponseTooLarge));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(AttemptFailure::Fatal(FetchError::ResponseTooLarge));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
