//! Feed normalization.
//!
//! Turns raw RSS 2.0, RSS 1.0 or Atom bytes into a bounded list of
//! [`NormalizedItem`]s plus the latest normalized date of the feed.
//!
//! # Submodules
//!
//! - [`xml`]: owned element tree with resolved namespaces
//! - [`dialect`]: entry matchers tried in a fixed priority order
//! - [`fields`]: ordered candidate tags per field
//! - [`date`]: RFC 822 / ISO 8601 date normalization
//! - [`text`]: description cleaning and truncation
//! - [`mirror`]: well-formed truncation of the raw document
//!
//! # Failure Modes
//!
//! A document that is not well-formed XML, or that has no `item`/`entry`
//! elements, never raises past this module: [`normalize`] reports it as an
//! empty item list with the `"Error"` marker, and [`parse_feed`] returns the
//! typed [`FeedError`] for callers that need to tell the two apart.

pub mod date;
pub mod dialect;
pub mod fields;
pub mod mirror;
pub mod text;
pub mod xml;

use std::error::Error;
use std::fmt;
use tracing::{debug, instrument};

use crate::models::{ItemDate, NOT_AVAILABLE, NormalizedItem};

/// Marker returned as the latest date when a document could not be used.
pub const ERROR_MARKER: &str = "Error";

/// Default number of items kept per source.
pub const DEFAULT_CAP: usize = 5;

#[derive(Debug)]
pub enum FeedError {
    /// The document is not well-formed XML.
    Malformed(String),
    /// Well-formed XML, but no dialect found any entries.
    NoEntries,
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::Malformed(msg) => write!(f, "malformed feed XML: {msg}"),
            FeedError::NoEntries => f.write_str("no <item> or <entry> elements found"),
        }
    }
}

impl Error for FeedError {}

impl From<quick_xml::Error> for FeedError {
    fn from(e: quick_xml::Error) -> Self {
        FeedError::Malformed(e.to_string())
    }
}

/// The usable part of one feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSummary {
    pub items: Vec<NormalizedItem>,
    /// Greatest normalized item date, or `"N/A"`.
    pub latest_date: String,
}

/// Parse and normalize one document, keeping at most `cap` entries.
///
/// # Arguments
///
/// * `document` - Raw feed bytes as served; the declared encoding is honored
/// * `source` - Label copied into every item
/// * `cap` - Maximum number of entries to keep, in document order
///
/// # Errors
///
/// - [`FeedError::Malformed`] if the bytes are not well-formed XML
/// - [`FeedError::NoEntries`] if no dialect finds an `item` or `entry`
#[instrument(level = "debug", skip(document), fields(bytes = document.len()))]
pub fn parse_feed(document: &[u8], source: &str, cap: usize) -> Result<FeedSummary, FeedError> {
    let input = xml::decode_document(document);
    let root = xml::parse_document(&input)?;
    let (dialect, entries) = dialect::find_entries(&root).ok_or(FeedError::NoEntries)?;
    debug!(dialect = dialect.name(), entries = entries.len(), "Matched feed entries");

    let items: Vec<NormalizedItem> = entries
        .into_iter()
        .take(cap)
        .map(|entry| normalize_entry(entry, source))
        .collect();

    let latest_date = latest_normalized_date(&items);
    Ok(FeedSummary { items, latest_date })
}

/// Normalize one document; failures become `([], "Error")`.
///
/// # Returns
///
/// The items (at most `cap`) and the latest normalized item date, `"N/A"`
/// when no item date could be normalized.
pub fn normalize(document: &[u8], source: &str, cap: usize) -> (Vec<NormalizedItem>, String) {
    match parse_feed(document, source, cap) {
        Ok(summary) => (summary.items, summary.latest_date),
        Err(e) => {
            debug!(%source, error = %e, "Feed could not be normalized");
            (Vec::new(), ERROR_MARKER.to_string())
        }
    }
}

fn normalize_entry(entry: &xml::Element, source: &str) -> NormalizedItem {
    NormalizedItem {
        source: source.to_string(),
        title: fields::title(entry),
        url: fields::link(entry).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        date: fields::raw_date(entry)
            .map(|raw| date::normalize_date(&raw))
            .unwrap_or(ItemDate::Missing),
        desc: fields::raw_description(entry)
            .map(|raw| text::clean_description(&raw))
            .unwrap_or_default(),
    }
}

/// Lexicographic maximum over normalized dates only; raw fallbacks and
/// missing dates never take part.
pub fn latest_normalized_date(items: &[NormalizedItem]) -> String {
    items
        .iter()
        .filter_map(|item| item.date.normalized())
        .max()
        .unwrap_or(NOT_AVAILABLE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn rss(n: usize) -> String {
        let items: String = (0..n)
            .map(|i| {
                let day = (i % 9) as u32 + 1;
                let pub_date = Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap().to_rfc2822();
                format!(
                    "<item><title>Post {i}</title><link>https://example.com/{i}</link>\
                     <pubDate>{pub_date}</pubDate>\
                     <description>&lt;p&gt;Body {i}&lt;/p&gt;</description></item>"
                )
            })
            .collect();
        format!(r#"<?xml version="1.0"?><rss version="2.0"><channel><title>T</title>{items}</channel></rss>"#)
    }

    fn atom(n: usize, namespaced: bool) -> String {
        let ns = if namespaced { r#" xmlns="http://www.w3.org/2005/Atom""# } else { "" };
        let entries: String = (0..n)
            .map(|i| {
                format!(
                    r#"<entry><title>Entry {i}</title><link href="https://example.com/e/{i}"/>
                       <updated>2024-03-0{d}T09:00:00Z</updated><summary>Summary {i}</summary></entry>"#,
                    d = (i % 9) + 1
                )
            })
            .collect();
        format!("<feed{ns}><title>T</title>{entries}</feed>")
    }

    #[test]
    fn test_rss_count_is_min_of_items_and_cap() {
        for (n, cap) in [(3, 5), (5, 5), (8, 5), (4, 0), (0, 5)] {
            let (items, _) = normalize(rss(n).as_bytes(), "src", cap);
            if n == 0 {
                assert!(items.is_empty());
            } else {
                assert_eq!(items.len(), n.min(cap), "n={n} cap={cap}");
            }
        }
    }

    #[test]
    fn test_rss_items_keep_document_order_and_fields() {
        let (items, latest) = normalize(rss(3).as_bytes(), "OpenAI", 5);
        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["Post 0", "Post 1", "Post 2"]);
        assert_eq!(items[0].source, "OpenAI");
        assert_eq!(items[0].url, "https://example.com/0");
        assert_eq!(items[0].date, ItemDate::Normalized("2024-01-01 10:00".into()));
        assert_eq!(items[0].desc, "Body 0");
        assert_eq!(latest, "2024-01-03 10:00");
    }

    #[test]
    fn test_atom_count_law_both_forms() {
        for namespaced in [true, false] {
            let (items, latest) = normalize(atom(7, namespaced).as_bytes(), "DeepMind", 5);
            assert_eq!(items.len(), 5);
            assert_eq!(items[4].title, "Entry 4");
            assert_eq!(items[1].url, "https://example.com/e/1");
            assert_eq!(items[2].desc, "Summary 2");
            assert_eq!(latest, "2024-03-05 09:00");
        }
    }

    #[test]
    fn test_garbage_returns_error_marker() {
        let inputs: [&[u8]; 4] = [b"not xml at all", b"", b"<rss><channel><item><title>cut", b"\x00\xff\xfe"];
        for input in inputs {
            let (items, latest) = normalize(input, "src", 5);
            assert!(items.is_empty());
            assert_eq!(latest, ERROR_MARKER);
        }
    }

    #[test]
    fn test_no_entries_is_typed_separately() {
        let doc = b"<rss><channel><title>Empty</title></channel></rss>";
        assert!(matches!(parse_feed(doc, "src", 5), Err(FeedError::NoEntries)));
        assert_eq!(normalize(doc, "src", 5), (Vec::new(), ERROR_MARKER.to_string()));
        assert!(matches!(parse_feed(b"<rss>", "src", 5), Err(FeedError::Malformed(_))));
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let (items, latest) = normalize(b"<rss><channel><item/></channel></rss>", "src", 5);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, fields::DEFAULT_TITLE);
        assert_eq!(items[0].url, NOT_AVAILABLE);
        assert_eq!(items[0].date, ItemDate::Missing);
        assert_eq!(items[0].desc, "");
        assert_eq!(latest, NOT_AVAILABLE);
    }

    #[test]
    fn test_latest_ignores_raw_dates() {
        let doc = b"<rss><channel>\
            <item><pubDate>2024-01-01T10:00:00Z</pubDate></item>\
            <item><pubDate>zzz not a date</pubDate></item>\
            <item><pubDate>Tue, 05 Mar 2024 09:00:00 GMT</pubDate></item>\
            </channel></rss>";
        let (items, latest) = normalize(doc, "src", 5);
        assert_eq!(items[1].date, ItemDate::Raw("zzz not a date".into()));
        assert_eq!(latest, "2024-03-05 09:00");
    }

    #[test]
    fn test_long_description_truncated() {
        let body = "x".repeat(1000);
        let doc = format!("<rss><channel><item><description><![CDATA[<p>{body}</p>]]></description></item></channel></rss>");
        let (items, _) = normalize(doc.as_bytes(), "src", 5);
        assert_eq!(items[0].desc.chars().count(), text::MAX_DESC_CHARS);
        assert!(!items[0].desc.contains('<'));
    }

    #[test]
    fn test_inline_markup_keeps_text_order() {
        let doc = b"<rss><channel><item><title>T</title>\
            <description>Start <i>middle</i> end</description></item></channel></rss>";
        let (items, _) = normalize(doc, "src", 5);
        assert_eq!(items[0].desc, "Start middle end");
    }

    #[test]
    fn test_atom_xhtml_content_keeps_text_order() {
        let doc = br#"<feed xmlns="http://www.w3.org/2005/Atom"><entry><title>T</title>
            <content type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml">Hello <b>bold</b> world</div></content>
            </entry></feed>"#;
        let (items, _) = normalize(doc, "src", 5);
        assert_eq!(items[0].desc, "Hello bold world");
    }

    #[test]
    fn test_declared_encoding_is_honored() {
        let doc = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\
            <rss><channel><item><title>Caf\xe9 cr\xe8me</title></item></channel></rss>";
        let (items, _) = normalize(doc, "src", 5);
        assert_eq!(items[0].title, "Café crème");
    }

    #[test]
    fn test_mixed_namespaces_rss_with_atom_self_link() {
        let doc = r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom" xmlns:dc="http://purl.org/dc/elements/1.1/">
            <channel><atom:link href="https://example.com/feed" rel="self"/>
            <item><title>Hi</title><link>https://example.com/hi</link><dc:date>2024-02-01T08:30:00+08:00</dc:date></item>
            </channel></rss>"#;
        let (items, latest) = normalize(doc.as_bytes(), "src", 5);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://example.com/hi");
        assert_eq!(latest, "2024-02-01 08:30");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let doc = rss(6);
        let first = serde_json::to_string(&normalize(doc.as_bytes(), "src", 5).0).unwrap();
        let second = serde_json::to_string(&normalize(doc.as_bytes(), "src", 5).0).unwrap();
        assert_eq!(first, second);
    }
}
