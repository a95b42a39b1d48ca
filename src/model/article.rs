use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One article from a feed.
///
/// The `identifier` is the dedup key: an explicit `<guid>`/`<id>` when the
/// feed provides one, otherwise the article URL (see the ingest builder
/// for the full fallback chain). Within a feed no two articles ever share
/// an identifier — [`crate::model::Feed::add_article`] enforces that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub identifier: String,
    pub title: String,
    /// Article permalink. May be empty for pathological feeds.
    pub url: String,
    /// Summary exactly as found in the feed, possibly entity-escaped HTML.
    pub raw_summary: String,
    /// Derived summary: tags stripped, entities decoded, trimmed.
    pub summary: String,
    /// Publish date from the feed; a fetch-time stand-in when absent.
    pub publish_date: DateTime<Utc>,
    /// True when `publish_date` is a fetch-time default rather than a
    /// parsed value. A later fetch that carries a real date may replace a
    /// defaulted one; a real date is never overwritten.
    #[serde(default)]
    pub date_is_default: bool,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub saved: bool,
    /// URL of a `media:thumbnail`, when the item carried one. The image
    /// bytes themselves are fetched by an external collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    /// Set during parsing when the thumbnail URL changed and the image
    /// should be (re)downloaded. Not persisted.
    #[serde(skip)]
    pub needs_thumbnail_fetch: bool,
}

impl Article {
    /// Overwrites feed-sourced metadata from a freshly parsed article.
    ///
    /// User state (`read`, `saved`) and the cached thumbnail URL are never
    /// touched here; that is the whole point of updating in place instead
    /// of replacing. The publish date is replaced only when the stored one
    /// was a fetch-time default and the incoming one is real, so sort
    /// order stays stable across refreshes.
    pub fn update_from(&mut self, other: &Article) {
        self.title = other.title.clone();
        self.url = other.url.clone();
        self.raw_summary = other.raw_summary.clone();
        self.summary = other.summary.clone();
        if self.date_is_default && !other.date_is_default {
            self.publish_date = other.publish_date;
            self.date_is_default = false;
        }
    }

    /// Sets the read flag, returning whether it changed.
    pub fn mark_read(&mut self, read: bool) -> bool {
        let changed = self.read != read;
        self.read = read;
        changed
    }

    /// Sets the saved flag, returning whether it changed.
    pub fn set_saved(&mut self, saved: bool) -> bool {
        let changed = self.saved != saved;
        self.saved = saved;
        changed
    }

    /// True when the article is older than `days_to_keep` days.
    ///
    /// Saved articles are exempt from expiration, but that exemption is
    /// the caller's to apply — this only answers the age question.
    pub fn is_expired(&self, days_to_keep: i64, now: DateTime<Utc>) -> bool {
        if days_to_keep <= 0 {
            return false;
        }
        (now - self.publish_date).num_days() >= days_to_keep
    }

    /// Sort key for alphabetical ordering: the title with everything
    /// non-alphanumeric removed.
    pub fn sort_title(&self) -> String {
        self.title.chars().filter(|c| c.is_alphanumeric()).collect()
    }
}
