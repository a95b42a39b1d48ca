use crate::ingest::builder::ArticleDraft;
use crate::ingest::dates::parse_feed_date;
use crate::ingest::html::decode_entities;
use crate::ingest::IngestContext;
use crate::model::Feed;

/// What the element currently being read means for the feed.
///
/// Classification happens once, on open, from the tag name and the kind
/// of the enclosing element. Both RSS 2.0 and Atom names map onto the
/// same kinds, so everything downstream is dialect-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `<channel>` (RSS) or `<feed>` (Atom) root.
    Channel,
    /// `<title>` directly under the channel.
    FeedTitle,
    /// `<image>` under the channel (RSS); its `<url>` child is the logo.
    FeedImage,
    /// `<icon>` under the channel (Atom).
    FeedIconUrl,
    /// `<logo>` under the channel (Atom) or `<url>` under `<image>` (RSS).
    FeedLogoUrl,
    /// `<link>` inside an item. Atom carries the URL in `href`; RSS as text.
    Link,
    /// `<item>` (RSS) or `<entry>` (Atom).
    Item,
    ItemTitle,
    /// `<guid>` (RSS) or `<id>` (Atom).
    ItemId,
    /// `<description>` (RSS) or `<summary>` (Atom).
    ItemDesc,
    /// `<pubDate>` (RSS) or `<published>`/`<updated>` (Atom).
    ItemPubDate,
    /// `<media:thumbnail>` inside an item.
    ItemThumb,
    /// Anything else. Content is skipped, children still classified.
    Unknown,
}

/// Streaming scanner over feed XML.
///
/// The tokenizer hands this open/text/close callbacks; the scanner keeps
/// an explicit stack of [`ElementKind`]s plus the draft of the article
/// currently being read, and writes results straight into the [`Feed`].
pub struct FeedScanner {
    stack: Vec<ElementKind>,
    draft: Option<ArticleDraft>,
    /// True once an item's link came from an `href` attribute; text inside
    /// that `<link>` (whitespace in formatted Atom) must then be ignored.
    link_href_taken: bool,
    articles_added: usize,
}

impl FeedScanner {
    pub fn new() -> Self {
        FeedScanner {
            stack: Vec::new(),
            draft: None,
            link_href_taken: false,
            articles_added: 0,
        }
    }

    /// Articles appended to the feed so far (updates to existing articles
    /// are not counted).
    pub fn articles_added(&self) -> usize {
        self.articles_added
    }

    /// Innermost open element; the enclosing element when called before a
    /// push, the element itself when called between open and close.
    fn current(&self) -> Option<ElementKind> {
        self.stack.last().copied()
    }

    /// Classifies an opening tag and applies its side effects.
    /// `attributes` are already decoded name/value pairs.
    pub fn open(&mut self, feed: &mut Feed, name: &str, attributes: &[(String, String)]) {
        let parent = self.current();
        let in_item = parent == Some(ElementKind::Item) && self.draft.is_some();

        let kind = match name {
            "channel" | "feed" => {
                // a fresh parse starts the title over, even on re-fetch
                feed.channel_title = Some(String::new());
                ElementKind::Channel
            }
            "item" | "entry" => {
                self.draft = Some(ArticleDraft::new());
                self.link_href_taken = false;
                ElementKind::Item
            }
            "title" if in_item => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.title.clear();
                }
                ElementKind::ItemTitle
            }
            "title" if parent == Some(ElementKind::Channel) => ElementKind::FeedTitle,
            "link" if in_item => {
                self.open_item_link(attributes);
                ElementKind::Link
            }
            "image" if parent == Some(ElementKind::Channel) => ElementKind::FeedImage,
            "url" if parent == Some(ElementKind::FeedImage) => ElementKind::FeedLogoUrl,
            "logo" if parent == Some(ElementKind::Channel) => ElementKind::FeedLogoUrl,
            "icon" if parent == Some(ElementKind::Channel) => ElementKind::FeedIconUrl,
            "guid" | "id" if in_item => ElementKind::ItemId,
            "description" | "summary" if in_item => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.raw_summary.clear();
                }
                ElementKind::ItemDesc
            }
            "pubDate" | "published" | "updated" if in_item => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.date_buf.clear();
                }
                ElementKind::ItemPubDate
            }
            "media:thumbnail" if in_item => {
                self.open_item_thumbnail(attributes);
                ElementKind::ItemThumb
            }
            _ => ElementKind::Unknown,
        };

        self.stack.push(kind);
    }

    /// Atom `<link rel="..." href="...">`. Only the `alternate` relation
    /// (also the default when `rel` is absent) names the article page.
    fn open_item_link(&mut self, attributes: &[(String, String)]) {
        let rel = attributes
            .iter()
            .find(|(n, _)| n == "rel")
            .map(|(_, v)| v.as_str())
            .unwrap_or("alternate");
        let href = attributes
            .iter()
            .find(|(n, _)| n == "href")
            .map(|(_, v)| v.as_str());

        match (rel, href) {
            ("edit", _) => {
                tracing::debug!("Skipping edit link");
            }
            ("alternate", Some(href)) => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.url = href.to_string();
                    self.link_href_taken = true;
                }
            }
            _ => {}
        }
    }

    fn open_item_thumbnail(&mut self, attributes: &[(String, String)]) {
        let url = attributes
            .iter()
            .find(|(n, _)| n == "url")
            .map(|(_, v)| v.clone());
        if let (Some(draft), Some(url)) = (self.draft.as_mut(), url) {
            if draft.thumbnail_url.as_deref() != Some(url.as_str()) {
                draft.needs_thumbnail_fetch = true;
            }
            draft.thumbnail_url = Some(url);
        }
    }

    /// Routes character data to the field owned by the innermost element.
    pub fn text(&mut self, feed: &mut Feed, text: &str) {
        let Some(kind) = self.current() else {
            return;
        };
        match kind {
            ElementKind::FeedTitle => {
                feed.channel_title
                    .get_or_insert_with(String::new)
                    .push_str(text);
            }
            ElementKind::FeedIconUrl => {
                // indentation around the value arrives as its own
                // fragments; only a real value may overwrite
                let text = text.trim();
                if text.is_empty() {
                    return;
                }
                if feed.icon_url.as_deref() != Some(text) {
                    feed.needs_icon_fetch = true;
                }
                feed.icon_url = Some(text.to_string());
            }
            ElementKind::FeedLogoUrl => {
                let text = text.trim();
                if text.is_empty() {
                    return;
                }
                if feed.logo_url.as_deref() != Some(text) {
                    feed.needs_logo_fetch = true;
                }
                feed.logo_url = Some(text.to_string());
            }
            ElementKind::Link => {
                if !self.link_href_taken {
                    if let Some(draft) = self.draft.as_mut() {
                        draft.url.push_str(text);
                    }
                }
            }
            ElementKind::ItemTitle => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.title.push_str(text);
                }
            }
            ElementKind::ItemId => {
                let text = text.trim();
                if text.is_empty() {
                    return;
                }
                if let Some(draft) = self.draft.as_mut() {
                    draft.identifier = Some(text.to_string());
                }
            }
            ElementKind::ItemDesc => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.raw_summary.push_str(text);
                }
            }
            ElementKind::ItemPubDate => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.date_buf.push_str(text);
                }
            }
            _ => {}
        }
    }

    /// Closes the innermost element, finalizing whatever it accumulated.
    pub fn close(&mut self, feed: &mut Feed, ctx: &IngestContext) {
        let Some(kind) = self.stack.pop() else {
            return;
        };
        match kind {
            ElementKind::Channel => {
                // a feed that only names one image serves for both roles
                if feed.icon_url.is_none() && feed.logo_url.is_some() {
                    feed.icon_url = feed.logo_url.clone();
                    feed.needs_icon_fetch = true;
                } else if feed.logo_url.is_none() && feed.icon_url.is_some() {
                    feed.logo_url = feed.icon_url.clone();
                    feed.needs_logo_fetch = true;
                }
            }
            ElementKind::Item => {
                if let Some(draft) = self.draft.take() {
                    let before = feed.articles.len();
                    feed.add_article(draft.finalize(ctx.fetched_at), ctx.tombstones);
                    if feed.articles.len() > before {
                        self.articles_added += 1;
                    }
                }
                self.link_href_taken = false;
            }
            ElementKind::FeedTitle => {
                if let Some(title) = feed.channel_title.as_mut() {
                    *title = title.trim().to_string();
                }
            }
            ElementKind::Link => {
                if !self.link_href_taken {
                    if let Some(draft) = self.draft.as_mut() {
                        draft.url = draft.url.trim().to_string();
                    }
                }
            }
            ElementKind::ItemTitle => {
                if let Some(draft) = self.draft.as_mut() {
                    draft.title = decode_entities(&draft.title).into_owned();
                }
            }
            ElementKind::ItemPubDate => {
                if let Some(draft) = self.draft.as_mut() {
                    // the first element that parses wins; a later
                    // `<updated>` does not displace `<published>`
                    if draft.publish_date.is_none() {
                        draft.publish_date = parse_feed_date(draft.date_buf.trim());
                    }
                    draft.date_buf.clear();
                }
            }
            _ => {}
        }
    }
}

impl Default for FeedScanner {
    fn default() -> Self {
        FeedScanner::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    fn scan_open(scanner: &mut FeedScanner, feed: &mut Feed, name: &str) {
        scanner.open(feed, name, &[]);
    }

    #[test]
    fn test_title_classification_depends_on_parent() {
        let mut feed = Feed::new("https://example.com/rss").unwrap();
        let mut scanner = FeedScanner::new();

        scan_open(&mut scanner, &mut feed, "channel");
        scan_open(&mut scanner, &mut feed, "title");
        scanner.text(&mut feed, "Channel Title");
        assert_eq!(feed.channel_title.as_deref(), Some("Channel Title"));

        let none = HashSet::new();
        let ctx = IngestContext::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), &none);
        scanner.close(&mut feed, &ctx); // </title>

        scan_open(&mut scanner, &mut feed, "item");
        scan_open(&mut scanner, &mut feed, "title");
        scanner.text(&mut feed, "Item Title");
        // item title goes to the draft, not the channel
        assert_eq!(feed.channel_title.as_deref(), Some("Channel Title"));
    }

    #[test]
    fn test_link_href_suppresses_text() {
        let mut feed = Feed::new("https://example.com/atom").unwrap();
        let mut scanner = FeedScanner::new();
        let none = HashSet::new();
        let ctx = IngestContext::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), &none);

        scan_open(&mut scanner, &mut feed, "feed");
        scan_open(&mut scanner, &mut feed, "entry");
        scanner.open(
            &mut feed,
            "link",
            &[("href".to_string(), "https://example.com/post".to_string())],
        );
        scanner.text(&mut feed, "stray whitespace");
        scanner.close(&mut feed, &ctx); // </link>
        scan_open(&mut scanner, &mut feed, "id");
        scanner.text(&mut feed, "post-1");
        scanner.close(&mut feed, &ctx); // </id>
        scanner.close(&mut feed, &ctx); // </entry>

        assert_eq!(feed.articles[0].url, "https://example.com/post");
    }

    #[test]
    fn test_edit_link_ignored() {
        let mut feed = Feed::new("https://example.com/atom").unwrap();
        let mut scanner = FeedScanner::new();
        let none = HashSet::new();
        let ctx = IngestContext::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), &none);

        scan_open(&mut scanner, &mut feed, "feed");
        scan_open(&mut scanner, &mut feed, "entry");
        scanner.open(
            &mut feed,
            "link",
            &[
                ("rel".to_string(), "edit".to_string()),
                ("href".to_string(), "https://example.com/edit/1".to_string()),
            ],
        );
        scanner.close(&mut feed, &ctx);
        scanner.open(
            &mut feed,
            "link",
            &[("href".to_string(), "https://example.com/post".to_string())],
        );
        scanner.close(&mut feed, &ctx);
        scanner.close(&mut feed, &ctx); // </entry>

        assert_eq!(feed.articles[0].url, "https://example.com/post");
    }

    #[test]
    fn test_channel_close_backfills_images() {
        let mut feed = Feed::new("https://example.com/rss").unwrap();
        let mut scanner = FeedScanner::new();
        let none = HashSet::new();
        let ctx = IngestContext::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), &none);

        scan_open(&mut scanner, &mut feed, "channel");
        scan_open(&mut scanner, &mut feed, "image");
        scan_open(&mut scanner, &mut feed, "url");
        scanner.text(&mut feed, "https://example.com/logo.png");
        scanner.close(&mut feed, &ctx); // </url>
        scanner.close(&mut feed, &ctx); // </image>
        scanner.close(&mut feed, &ctx); // </channel>

        assert_eq!(feed.logo_url.as_deref(), Some("https://example.com/logo.png"));
        assert_eq!(feed.icon_url.as_deref(), Some("https://example.com/logo.png"));
        assert!(feed.needs_icon_fetch);
    }

    #[test]
    fn test_first_parsed_date_wins() {
        let mut feed = Feed::new("https://example.com/atom").unwrap();
        let mut scanner = FeedScanner::new();
        let none = HashSet::new();
        let ctx = IngestContext::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), &none);

        scan_open(&mut scanner, &mut feed, "feed");
        scan_open(&mut scanner, &mut feed, "entry");
        scan_open(&mut scanner, &mut feed, "id");
        scanner.text(&mut feed, "post-1");
        scanner.close(&mut feed, &ctx);
        scan_open(&mut scanner, &mut feed, "published");
        scanner.text(&mut feed, "2024-03-01T08:00:00Z");
        scanner.close(&mut feed, &ctx);
        scan_open(&mut scanner, &mut feed, "updated");
        scanner.text(&mut feed, "2024-04-15T09:30:00Z");
        scanner.close(&mut feed, &ctx);
        scanner.close(&mut feed, &ctx); // </entry>

        assert_eq!(
            feed.articles[0].publish_date,
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
        );
        assert!(!feed.articles[0].date_is_default);
    }

    #[test]
    fn test_unknown_elements_are_skipped() {
        let mut feed = Feed::new("https://example.com/rss").unwrap();
        let mut scanner = FeedScanner::new();
        let none = HashSet::new();
        let ctx = IngestContext::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), &none);

        scan_open(&mut scanner, &mut feed, "channel");
        scan_open(&mut scanner, &mut feed, "generator");
        scanner.text(&mut feed, "Some CMS");
        scanner.close(&mut feed, &ctx);
        scan_open(&mut scanner, &mut feed, "item");
        scan_open(&mut scanner, &mut feed, "dc:creator");
        scanner.text(&mut feed, "Author Name");
        scanner.close(&mut feed, &ctx);
        scan_open(&mut scanner, &mut feed, "guid");
        scanner.text(&mut feed, "post-1");
        scanner.close(&mut feed, &ctx);
        scanner.close(&mut feed, &ctx); // </item>
        scanner.close(&mut feed, &ctx); // </channel>

        assert_eq!(feed.articles.len(), 1);
        assert_eq!(feed.articles[0].identifier, "post-1");
        assert!(feed.articles[0].title.is_empty());
        assert_eq!(scanner.articles_added(), 1);
    }
}
