//! Domain model: articles, feeds, groups, and the library that owns them.

mod article;
mod collection;
mod feed;
mod group;
mod library;

pub use article::Article;
pub use collection::{sort_articles, ArticleCollection, ArticleList, SortOrder};
pub use feed::Feed;
pub use group::FeedGroup;
pub use library::{Library, Tombstones};
