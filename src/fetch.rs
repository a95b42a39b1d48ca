//! HTTP fetching and concurrent refresh of subscribed feeds.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use thiserror::Error;

use crate::ingest::{self, IngestContext};
use crate::model::{Feed, Tombstones};

/// Knobs for a refresh pass. Defaults match ordinary interactive use.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// How many feeds to fetch simultaneously.
    pub max_concurrent: usize,
    /// Response body cap; larger bodies abort the fetch.
    pub max_response_bytes: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        FetchOptions {
            timeout: Duration::from_secs(30),
            max_concurrent: 10,
            max_response_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Errors from fetching or ingesting one feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the configured size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
    /// Feed XML could not be ingested as RSS or Atom
    #[error("Parse error: {0}")]
    Parse(String),
    /// A fetch for this feed is already in flight
    #[error("Feed is already being refreshed")]
    AlreadyLoading,
}

/// Outcome of refreshing one feed, keyed by its URL.
pub struct RefreshOutcome {
    pub url: String,
    /// Number of new articles ingested, or the error that occurred.
    pub result: Result<usize, FetchError>,
}

/// Refreshes a single feed in place.
///
/// Guards against overlapping fetches via the feed's `loading` flag; the
/// flag is cleared again on every exit path. Returns the number of new
/// articles.
pub async fn refresh_feed(
    client: &reqwest::Client,
    feed: &mut Feed,
    tombstones: &dyn Tombstones,
    options: &FetchOptions,
) -> Result<usize, FetchError> {
    if feed.loading {
        return Err(FetchError::AlreadyLoading);
    }
    feed.loading = true;

    let fetched = fetch_feed_bytes(client, &feed.url, options).await;
    let result = match fetched {
        Ok(bytes) => {
            let ctx = IngestContext::new(tombstones);
            ingest::parse(feed, &ctx, &bytes).map_err(|e| FetchError::Parse(e.to_string()))
        }
        Err(e) => Err(e),
    };

    feed.loading = false;
    log_outcome(feed, &result);
    result
}

/// Refreshes many feeds with bounded concurrency.
///
/// Network I/O runs up to `max_concurrent` fetches in parallel; ingestion
/// happens sequentially as responses arrive, so every feed is mutated by
/// exactly one writer. Feeds already mid-fetch are skipped. `on_complete`
/// runs once per attempted feed, right after its ingestion settles.
///
/// Outcomes are returned in completion order, not input order.
pub async fn refresh_all(
    client: &reqwest::Client,
    feeds: &mut [Feed],
    tombstones: &dyn Tombstones,
    options: &FetchOptions,
    mut on_complete: impl FnMut(&Feed, &Result<usize, FetchError>),
) -> Vec<RefreshOutcome> {
    let jobs: Vec<(usize, String)> = feeds
        .iter()
        .enumerate()
        .filter(|(_, f)| !f.loading)
        .map(|(i, f)| (i, f.url.clone()))
        .collect();
    for (i, _) in &jobs {
        feeds[*i].loading = true;
    }

    // one clock value for the whole pass keeps missing-date fallbacks
    // consistent across feeds
    let fetched_at = chrono::Utc::now();

    let mut responses = stream::iter(jobs.into_iter().map(|(i, url)| {
        let client = client.clone();
        let options = options.clone();
        async move { (i, fetch_feed_bytes(&client, &url, &options).await) }
    }))
    .buffer_unordered(options.max_concurrent);

    let mut outcomes = Vec::new();
    while let Some((i, fetched)) = responses.next().await {
        let feed = &mut feeds[i];
        let result = match fetched {
            Ok(bytes) => {
                let ctx = IngestContext::at(fetched_at, tombstones);
                ingest::parse(feed, &ctx, &bytes).map_err(|e| FetchError::Parse(e.to_string()))
            }
            Err(e) => Err(e),
        };
        feed.loading = false;
        log_outcome(feed, &result);
        on_complete(feed, &result);
        outcomes.push(RefreshOutcome {
            url: feed.url.clone(),
            result,
        });
    }
    outcomes
}

fn log_outcome(feed: &Feed, result: &Result<usize, FetchError>) {
    match result {
        Ok(added) => {
            tracing::debug!(feed = %feed.url, added = added, "Feed refreshed");
        }
        Err(e) => {
            tracing::warn!(feed = %feed.url, error = %e, "Feed refresh failed");
        }
    }
}

async fn fetch_feed_bytes(
    client: &reqwest::Client,
    url: &str,
    options: &FetchOptions,
) -> Result<Vec<u8>, FetchError> {
    let response = tokio::time::timeout(options.timeout, client.get(url).send())
        .await
        .map_err(|_| FetchError::Timeout)?
        .map_err(FetchError::Network)?;

    if !response.status().is_success() {
        return Err(FetchError::HttpStatus(response.status().as_u16()));
    }

    read_limited_bytes(response, options.max_response_bytes).await
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    let expected_length = response.content_length();

    // fast path: trust Content-Length when the server names one
    if let Some(len) = expected_length {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    if let Some(expected) = expected_length {
        if (bytes.len() as u64) < expected {
            return Err(FetchError::IncompleteResponse {
                expected,
                received: bytes.len(),
            });
        }
    }

    Ok(bytes)
}
