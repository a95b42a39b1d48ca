//! skein — a personal RSS/Atom reader core.
//!
//! The crate is built around two pieces of hard logic:
//!
//! - **Ingestion** ([`ingest`]): a streaming RSS 2.0 / Atom 1.0 parser
//!   implemented as an incremental state machine over `quick-xml` events.
//!   Both dialects go through a single set of classification rules, and
//!   malformed input degrades gracefully instead of failing the whole feed.
//! - **Reconciliation** ([`model::Feed::add_article`]): merging freshly
//!   parsed articles into a feed's existing collection — dedup by
//!   identifier, in-place metadata updates that never clobber user state
//!   (read/saved), and tombstones so deleted articles stay deleted.
//!
//! Around the core sit thin collaborators: [`fetch`] (HTTP byte delivery),
//! [`store`] (JSON library snapshot with load-time expiration), and
//! [`config`] (TOML settings).

pub mod config;
pub mod fetch;
pub mod ingest;
pub mod model;
pub mod store;
pub mod util;

pub use config::Config;
pub use fetch::{FetchError, FetchOptions};
pub use ingest::{IngestContext, ParseError};
pub use model::{Article, ArticleCollection, Feed, FeedGroup, Library, SortOrder, Tombstones};
