use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{Article, Feed, FeedGroup};
use crate::util::{normalize_feed_url, validate_feed_url};

/// Lookup for user-deleted article identifiers.
///
/// The reconciler only reads this; the deletion path
/// ([`Library::delete_article`]) is the only writer.
pub trait Tombstones {
    fn is_deleted(&self, identifier: &str) -> bool;
}

impl Tombstones for HashSet<String> {
    fn is_deleted(&self, identifier: &str) -> bool {
        self.contains(identifier)
    }
}

/// The whole subscription set: feed groups plus the deleted-article
/// tombstone list. This is the unit the store persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    pub groups: Vec<FeedGroup>,
    /// Identifiers of user-deleted articles. A re-fetch of a tombstoned
    /// identifier is dropped by the reconciler instead of resurrected.
    #[serde(default)]
    pub deleted_ids: HashSet<String>,
}

impl Default for Library {
    fn default() -> Self {
        Library {
            groups: vec![FeedGroup::new("Default")],
            deleted_ids: HashSet::new(),
        }
    }
}

impl Library {
    pub fn feeds(&self) -> impl Iterator<Item = &Feed> {
        self.groups.iter().flat_map(|g| g.feeds.iter())
    }

    pub fn feeds_mut(&mut self) -> impl Iterator<Item = &mut Feed> {
        self.groups.iter_mut().flat_map(|g| g.feeds.iter_mut())
    }

    pub fn all_articles(&self) -> Vec<&Article> {
        self.feeds().flat_map(|f| f.articles.iter()).collect()
    }

    /// Finds a feed by subscription URL, canonicalizing the query the
    /// same way [`Feed::new`] canonicalizes the stored URL (scheme
    /// rewrite, lowercased host, `/` path for host-only URLs).
    pub fn find_feed(&self, url: &str) -> Option<&Feed> {
        let url = canonical_url(url);
        self.feeds().find(|f| f.url == url)
    }

    pub fn find_feed_mut(&mut self, url: &str) -> Option<&mut Feed> {
        let url = canonical_url(url);
        self.feeds_mut().find(|f| f.url == url)
    }

    /// The group named "Default", creating it if the library somehow has
    /// none.
    pub fn default_group_mut(&mut self) -> &mut FeedGroup {
        if !self.groups.iter().any(|g| g.user_set_title == "Default") {
            self.groups.insert(0, FeedGroup::new("Default"));
        }
        self.groups
            .iter_mut()
            .find(|g| g.user_set_title == "Default")
            .expect("default group exists")
    }

    pub fn group_mut(&mut self, title: &str) -> Option<&mut FeedGroup> {
        self.groups.iter_mut().find(|g| g.user_set_title == title)
    }

    /// Removes a feed by URL. Returns the removed feed, if any.
    pub fn remove_feed(&mut self, url: &str) -> Option<Feed> {
        let url = canonical_url(url);
        for group in &mut self.groups {
            if let Some(pos) = group.feeds.iter().position(|f| f.url == url) {
                return Some(group.feeds.remove(pos));
            }
        }
        None
    }

    /// Deletes an article by identifier and tombstones the identifier so
    /// future fetches cannot bring it back. Returns whether an article
    /// was actually removed.
    pub fn delete_article(&mut self, identifier: &str) -> bool {
        let mut removed = false;
        for feed in self.feeds_mut() {
            if let Some(pos) = feed.articles.iter().position(|a| a.identifier == identifier) {
                feed.articles.remove(pos);
                removed = true;
                break;
            }
        }
        if removed {
            tracing::info!(id = %identifier, "Disposed of article");
        }
        // tombstone regardless, so a pending fetch cannot re-add it
        self.deleted_ids.insert(identifier.to_string());
        removed
    }
}

/// Stored URLs went through full [`validate_feed_url`] parsing, so raw
/// queries must take the same path or exact user input can miss
/// (`https://example.com` is stored as `https://example.com/`). Inputs
/// that do not parse fall back to the string-level normalization; they
/// can only match nothing anyway.
fn canonical_url(query: &str) -> String {
    match validate_feed_url(query) {
        Ok(url) => url.into(),
        Err(_) => normalize_feed_url(query),
    }
}
