//! Feed ingestion: streaming XML scan plus reconciliation into a [`Feed`].
//!
//! The tokenizer is quick-xml; everything dialect-specific lives in
//! [`scanner::FeedScanner`], which classifies elements as they open and
//! routes text to the right field. Parsing mutates the feed in place, so
//! whatever was ingested before a syntax error is kept.

mod builder;
mod dates;
mod html;
mod scanner;

pub use html::{decode_entities, sanitize_summary, strip_tags_and_newlines};
pub use scanner::{ElementKind, FeedScanner};

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

use crate::model::{Feed, Tombstones};

/// Nesting cap; well-formed feeds sit at depth 4-5.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("XML parse error: {0}")]
    Xml(String),
    #[error("XML nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Per-parse inputs that are not part of the feed itself: the clock value
/// used for missing-date fallbacks and the deleted-article lookup.
pub struct IngestContext<'a> {
    pub fetched_at: DateTime<Utc>,
    pub tombstones: &'a dyn Tombstones,
}

impl<'a> IngestContext<'a> {
    pub fn new(tombstones: &'a dyn Tombstones) -> Self {
        IngestContext {
            fetched_at: Utc::now(),
            tombstones,
        }
    }

    /// Context with an explicit clock value, for deterministic tests and
    /// for refreshes that pin one timestamp across many feeds.
    pub fn at(fetched_at: DateTime<Utc>, tombstones: &'a dyn Tombstones) -> Self {
        IngestContext {
            fetched_at,
            tombstones,
        }
    }
}

/// Parses one feed document and merges its items into `feed`.
///
/// Returns the number of articles appended (updates to already-known
/// articles do not count). On a syntax error mid-document, articles
/// ingested before the error remain in the feed.
///
/// XXE is structurally impossible here: quick-xml never expands DOCTYPE
/// entity declarations, and unrecognized entities fall back to verbatim
/// text rather than resolution.
pub fn parse(feed: &mut Feed, ctx: &IngestContext, bytes: &[u8]) -> Result<usize, ParseError> {
    // no global text trimming: description fragments must keep their
    // spacing around inline child elements; fields that want trimmed
    // values (titles, ids, urls, dates) trim in the scanner instead
    let mut reader = Reader::from_reader(bytes);

    let mut scanner = FeedScanner::new();
    let mut depth: usize = 0;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(ParseError::TooDeep(MAX_DEPTH));
                }
                let name = reader.decoder().decode(e.name().as_ref()).map_err(xml_err)?.into_owned();
                let attributes = decode_attributes(&e, &reader)?;
                scanner.open(feed, &name, &attributes);
            }
            Ok(Event::Empty(e)) => {
                let name = reader.decoder().decode(e.name().as_ref()).map_err(xml_err)?.into_owned();
                let attributes = decode_attributes(&e, &reader)?;
                scanner.open(feed, &name, &attributes);
                scanner.close(feed, ctx);
            }
            Ok(Event::Text(t)) => {
                // feeds in the wild carry entities XML never defined;
                // fall back to the raw bytes instead of failing the parse
                let text = match t.unescape() {
                    Ok(text) => text.into_owned(),
                    Err(_) => reader
                        .decoder()
                        .decode(t.as_ref())
                        .map_err(xml_err)?
                        .into_owned(),
                };
                scanner.text(feed, &text);
            }
            Ok(Event::CData(c)) => {
                let text = reader.decoder().decode(c.as_ref()).map_err(xml_err)?;
                scanner.text(feed, &text);
            }
            Ok(Event::End(_)) => {
                depth = depth.saturating_sub(1);
                scanner.close(feed, ctx);
            }
            Ok(Event::Eof) => {
                // the tokenizer does not flag EOF with open elements on
                // its own; a truncated body must not look like success
                if depth > 0 {
                    return Err(ParseError::Xml("unexpected end of document".to_string()));
                }
                break;
            }
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(scanner.articles_added())
}

fn decode_attributes(
    e: &quick_xml::events::BytesStart<'_>,
    reader: &Reader<&[u8]>,
) -> Result<Vec<(String, String)>, ParseError> {
    let decoder = reader.decoder();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| ParseError::Xml(e.to_string()))?;
        let name = decoder.decode(attr.key.as_ref()).map_err(xml_err)?.into_owned();
        let value = attr
            .decode_and_unescape_value(decoder)
            .map_err(|e| ParseError::Xml(e.to_string()))?
            .into_owned();
        attributes.push((name, value));
    }
    Ok(attributes)
}

fn xml_err(e: impl std::fmt::Display) -> ParseError {
    ParseError::Xml(e.to_string())
}
