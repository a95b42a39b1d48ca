use serde::{Deserialize, Serialize};

use crate::model::{Article, Feed, FeedGroup, Library};

/// Read-only view over some set of articles: a single feed, a group, the
/// whole library, or an ad-hoc named list. Everything is recomputed on
/// access — there is no cached state to invalidate.
pub trait ArticleCollection {
    fn title(&self) -> String;

    /// All articles in the collection, in the owner's storage order.
    /// Sorting is the caller's job (see [`sort_articles`]).
    fn articles(&self) -> Vec<&Article>;

    /// For a feed, its own in-flight flag; for an aggregate, true while
    /// any member feed is loading.
    fn loading(&self) -> bool;

    fn unread(&self) -> Vec<&Article> {
        self.articles().into_iter().filter(|a| !a.read).collect()
    }

    fn saved(&self) -> Vec<&Article> {
        self.articles().into_iter().filter(|a| a.saved).collect()
    }
}

impl ArticleCollection for Feed {
    fn title(&self) -> String {
        Feed::title(self).to_string()
    }

    fn articles(&self) -> Vec<&Article> {
        self.articles.iter().collect()
    }

    fn loading(&self) -> bool {
        self.loading
    }
}

impl ArticleCollection for FeedGroup {
    fn title(&self) -> String {
        FeedGroup::title(self).to_string()
    }

    fn articles(&self) -> Vec<&Article> {
        self.feeds.iter().flat_map(|f| f.articles.iter()).collect()
    }

    fn loading(&self) -> bool {
        self.feeds.iter().any(|f| f.loading)
    }
}

impl ArticleCollection for Library {
    fn title(&self) -> String {
        "All Articles".to_string()
    }

    fn articles(&self) -> Vec<&Article> {
        self.all_articles()
    }

    fn loading(&self) -> bool {
        self.feeds().any(|f| f.loading)
    }
}

/// An ad-hoc named list of borrowed articles, for views like "saved" or
/// search results that cut across feeds.
pub struct ArticleList<'a> {
    pub title: String,
    pub articles: Vec<&'a Article>,
}

impl<'a> ArticleList<'a> {
    pub fn new(title: &str, articles: Vec<&'a Article>) -> Self {
        ArticleList {
            title: title.to_string(),
            articles,
        }
    }
}

impl ArticleCollection for ArticleList<'_> {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn articles(&self) -> Vec<&Article> {
        self.articles.clone()
    }

    fn loading(&self) -> bool {
        false
    }
}

/// Presentation sort order for article lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
    Alphabetical,
}

/// Sorts borrowed articles. Date orders break ties alphabetically (on
/// the alphanumeric-only sort key) so equal-timestamp articles have a
/// stable order.
pub fn sort_articles(articles: &mut [&Article], order: SortOrder) {
    match order {
        SortOrder::NewestFirst => articles.sort_by(|a, b| {
            b.publish_date
                .cmp(&a.publish_date)
                .then_with(|| a.sort_title().cmp(&b.sort_title()))
        }),
        SortOrder::OldestFirst => articles.sort_by(|a, b| {
            a.publish_date
                .cmp(&b.publish_date)
                .then_with(|| a.sort_title().cmp(&b.sort_title()))
        }),
        SortOrder::Alphabetical => articles.sort_by_key(|a| a.sort_title()),
    }
}
