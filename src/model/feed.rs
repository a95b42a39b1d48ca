use serde::{Deserialize, Serialize};

use crate::model::{Article, Tombstones};
use crate::util::{validate_feed_url, UrlError};

/// One subscribed feed and the articles it currently holds.
///
/// The URL is the feed's identity. Articles are kept in arrival order —
/// sorting is a presentation concern (see [`crate::model::sort_articles`]);
/// the hard invariant here is identifier uniqueness, owned by
/// [`Feed::add_article`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    /// Normalized subscription URL; the feed's identifier.
    pub url: String,
    /// Title the feed assigned to itself (`<title>` in the channel).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_title: Option<String>,
    /// Nickname assigned by the user; wins over the channel title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_set_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    /// Set during parsing when the icon URL changed and the image should
    /// be (re)downloaded by the image collaborator. Not persisted.
    #[serde(skip)]
    pub needs_icon_fetch: bool,
    #[serde(skip)]
    pub needs_logo_fetch: bool,
    /// True while a fetch for this feed is in flight. Callers must check
    /// this before starting another fetch of the same feed.
    #[serde(skip)]
    pub loading: bool,
    #[serde(default)]
    pub articles: Vec<Article>,
}

impl Feed {
    /// Creates a feed from a subscription URL, normalizing `feed:`
    /// pseudo-schemes and rejecting anything that is not http(s).
    pub fn new(url: &str) -> Result<Self, UrlError> {
        let url = validate_feed_url(url)?;
        Ok(Feed {
            url: url.into(),
            channel_title: None,
            user_set_title: None,
            icon_url: None,
            logo_url: None,
            needs_icon_fetch: false,
            needs_logo_fetch: false,
            loading: false,
            articles: Vec::new(),
        })
    }

    /// Effective title: user nickname, then channel title, then the URL.
    pub fn title(&self) -> &str {
        self.user_set_title
            .as_deref()
            .or(self.channel_title.as_deref())
            .unwrap_or(&self.url)
    }

    pub fn article(&self, identifier: &str) -> Option<&Article> {
        self.articles.iter().find(|a| a.identifier == identifier)
    }

    pub fn article_mut(&mut self, identifier: &str) -> Option<&mut Article> {
        self.articles
            .iter_mut()
            .find(|a| a.identifier == identifier)
    }

    /// Merges one freshly parsed article into the feed — the single
    /// mutation entry point for ingestion.
    ///
    /// - Tombstoned identifiers are dropped silently so user-deleted
    ///   articles do not come back on the next refresh.
    /// - An existing article with the same identifier is updated in place
    ///   (metadata only, never `read`/`saved`); its position is unchanged.
    /// - Otherwise the article is appended.
    ///
    /// Postcondition: no two articles in the feed share an identifier.
    pub fn add_article(&mut self, article: Article, deleted: &dyn Tombstones) {
        if deleted.is_deleted(&article.identifier) {
            tracing::debug!(
                feed = %self.url,
                id = %article.identifier,
                "Ignoring deleted article"
            );
            return;
        }

        if let Some(existing) = self.article_mut(&article.identifier) {
            existing.update_from(&article);
            return;
        }

        self.articles.push(article);
    }
}
