use serde::{Deserialize, Serialize};

use crate::model::Feed;

/// A named group of feeds.
///
/// Groups own their feeds (membership) and carry the per-group knobs:
/// how long to keep articles and whether the group takes part in
/// automatic refreshes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedGroup {
    /// User-assigned name. May be empty; [`FeedGroup::title`] substitutes
    /// "Unnamed" for display.
    pub user_set_title: String,
    #[serde(default)]
    pub feeds: Vec<Feed>,
    /// Days to keep unsaved articles. 0 means "use the global default".
    #[serde(default)]
    pub days_to_keep_articles: i64,
    #[serde(default = "default_true")]
    pub automatic_refresh: bool,
}

fn default_true() -> bool {
    true
}

impl FeedGroup {
    pub fn new(title: &str) -> Self {
        FeedGroup {
            user_set_title: title.to_string(),
            feeds: Vec::new(),
            days_to_keep_articles: 0,
            automatic_refresh: true,
        }
    }

    pub fn title(&self) -> &str {
        if self.user_set_title.is_empty() {
            "Unnamed"
        } else {
            &self.user_set_title
        }
    }

    /// The group's retention window, falling back to the global default
    /// when the group-specific value is unset (0).
    pub fn effective_days_to_keep(&self, default_days: i64) -> i64 {
        if self.days_to_keep_articles == 0 {
            default_days
        } else {
            self.days_to_keep_articles
        }
    }

    pub fn add_feed(&mut self, feed: Feed) {
        tracing::info!(group = %self.title(), feed = %feed.title(), "Added feed");
        self.feeds.push(feed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_title_displays_unnamed() {
        let group = FeedGroup::new("");
        assert_eq!(group.title(), "Unnamed");
        let named = FeedGroup::new("News");
        assert_eq!(named.title(), "News");
    }

    #[test]
    fn test_days_to_keep_fallback() {
        let mut group = FeedGroup::new("News");
        assert_eq!(group.effective_days_to_keep(10), 10);
        group.days_to_keep_articles = 3;
        assert_eq!(group.effective_days_to_keep(10), 3);
    }
}
