//! Feed URL normalization and validation.
//!
//! Subscription URLs arrive in the forms people actually paste:
//! `feed://example.com/rss`, `feed:https://example.com/rss`, or a plain
//! http(s) URL. Everything is normalized to http(s) before a feed is
//! created, and anything that is not http(s) afterwards is rejected.

use thiserror::Error;
use url::Url;

/// Errors from feed URL validation.
#[derive(Debug, Error)]
pub enum UrlError {
    /// The URL string could not be parsed at all.
    #[error("Invalid URL: {0}")]
    Invalid(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
}

/// Rewrites the `feed:` pseudo-schemes into plain http(s).
///
/// - `feed://host/path` becomes `http://host/path`
/// - `feed:https://host/path` loses the `feed:` prefix
///
/// Anything else is returned trimmed but otherwise untouched.
pub fn normalize_feed_url(raw: &str) -> String {
    let s = raw.trim();
    if let Some(rest) = s.strip_prefix("feed://") {
        return format!("http://{rest}");
    }
    if let Some(rest) = s.strip_prefix("feed:") {
        return rest.to_string();
    }
    s.to_string()
}

/// Normalizes and validates a subscription URL.
///
/// Returns the parsed [`Url`] on success so callers can inspect host/path,
/// though most only need the canonical string form.
pub fn validate_feed_url(raw: &str) -> Result<Url, UrlError> {
    let normalized = normalize_feed_url(raw);
    let url = Url::parse(&normalized)?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(UrlError::UnsupportedScheme(scheme.to_owned())),
    }
}
