use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::ingest::html::sanitize_summary;
use crate::model::Article;

/// Accumulator for the article currently being parsed.
///
/// The scanner fills fields in as elements arrive; nothing is validated
/// until [`ArticleDraft::finalize`] turns the draft into an [`Article`]
/// with every fallback applied.
#[derive(Debug, Default)]
pub struct ArticleDraft {
    pub title: String,
    pub url: String,
    /// Explicit `<guid>`/`<id>` from the feed, if one was seen.
    pub identifier: Option<String>,
    pub raw_summary: String,
    /// First successfully parsed date element. Later date elements on the
    /// same item do not replace it.
    pub publish_date: Option<DateTime<Utc>>,
    /// Text accumulated inside the currently open date element, parsed
    /// when that element closes.
    pub date_buf: String,
    pub thumbnail_url: Option<String>,
    pub needs_thumbnail_fetch: bool,
}

impl ArticleDraft {
    pub fn new() -> Self {
        ArticleDraft::default()
    }

    /// Resolves the draft into an article, applying the fallback chain:
    ///
    /// - missing date: `fetched_at`, flagged as a default;
    /// - missing identifier: the article URL, and with no URL either, a
    ///   digest of the title and date.
    pub fn finalize(self, fetched_at: DateTime<Utc>) -> Article {
        let title = self.title.trim().to_string();
        let (publish_date, date_is_default) = match self.publish_date {
            Some(date) => (date, false),
            None => (fetched_at, true),
        };
        let identifier = match self.identifier {
            Some(id) if !id.is_empty() => id,
            _ if !self.url.is_empty() => self.url.clone(),
            _ => fallback_identifier(&title, publish_date),
        };
        let summary = sanitize_summary(&self.raw_summary);
        Article {
            identifier,
            title,
            url: self.url,
            raw_summary: self.raw_summary,
            summary,
            publish_date,
            date_is_default,
            read: false,
            saved: false,
            thumbnail_url: self.thumbnail_url,
            needs_thumbnail_fetch: self.needs_thumbnail_fetch,
        }
    }
}

/// Deterministic identifier for items with neither a guid nor a link.
/// Equal title and date produce the same identifier across fetches.
fn fallback_identifier(title: &str, date: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"|");
    hasher.update(date.timestamp().to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fetched_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_finalize_prefers_explicit_identifier() {
        let draft = ArticleDraft {
            identifier: Some("tag:example.com,2024:1".to_string()),
            url: "https://example.com/post".to_string(),
            ..ArticleDraft::new()
        };
        let article = draft.finalize(fetched_at());
        assert_eq!(article.identifier, "tag:example.com,2024:1");
    }

    #[test]
    fn test_finalize_falls_back_to_url() {
        let draft = ArticleDraft {
            url: "https://example.com/post".to_string(),
            ..ArticleDraft::new()
        };
        let article = draft.finalize(fetched_at());
        assert_eq!(article.identifier, "https://example.com/post");
    }

    #[test]
    fn test_finalize_digest_fallback_is_deterministic() {
        let make = || ArticleDraft {
            title: "Some Title".to_string(),
            publish_date: Some(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()),
            ..ArticleDraft::new()
        };
        let a = make().finalize(fetched_at());
        let b = make().finalize(fetched_at());
        assert_eq!(a.identifier, b.identifier);
        assert_eq!(a.identifier.len(), 64);
    }

    #[test]
    fn test_finalize_defaults_missing_date() {
        let draft = ArticleDraft {
            url: "https://example.com/post".to_string(),
            ..ArticleDraft::new()
        };
        let article = draft.finalize(fetched_at());
        assert_eq!(article.publish_date, fetched_at());
        assert!(article.date_is_default);
    }

    #[test]
    fn test_finalize_trims_title_and_sanitizes_summary() {
        let draft = ArticleDraft {
            title: "  Spaced Out \n".to_string(),
            url: "https://example.com/post".to_string(),
            raw_summary: "<p>Hello &amp; welcome</p>\n".to_string(),
            ..ArticleDraft::new()
        };
        let article = draft.finalize(fetched_at());
        assert_eq!(article.title, "Spaced Out");
        assert_eq!(article.summary, "Hello & welcome");
        assert_eq!(article.raw_summary, "<p>Hello &amp; welcome</p>\n");
    }
}
