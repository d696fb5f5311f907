//! Well-formed truncation of raw feed documents.
//!
//! The mirror artifact carries each source's document as XML, cut down to
//! its first `cap` entries. Everything outside the dropped entries (channel
//! metadata, namespaces, comments) is written back unchanged through the
//! `quick-xml` writer, so the result is still a well-formed document. The
//! XML declaration is rewritten to UTF-8 because the output always is.

use quick_xml::events::{BytesDecl, Event};
use quick_xml::{Reader, Writer};

use super::FeedError;
use super::xml::decode_document;

/// Local names that start an entry in any supported dialect.
const ENTRY_NAMES: [&[u8]; 2] = [b"item", b"entry"];

fn is_entry(local_name: &[u8]) -> bool {
    ENTRY_NAMES.contains(&local_name)
}

fn write_error(e: std::io::Error) -> FeedError {
    FeedError::Malformed(format!("re-serializing failed: {e}"))
}

/// Keep the first `cap` top-level entries of `document` and drop the rest.
///
/// # Arguments
///
/// * `document` - Raw feed bytes in any declared encoding
/// * `cap` - Number of `item`/`entry` elements to keep
///
/// # Returns
///
/// The truncated document as UTF-8 XML text.
///
/// # Errors
///
/// [`FeedError::Malformed`] when the input is not well-formed XML, including
/// input that ends with elements still open.
pub fn truncate_document(document: &[u8], cap: usize) -> Result<String, FeedError> {
    let decoded = decode_document(document);
    let input = decoded.trim_start_matches('\u{FEFF}').trim_start();
    let mut reader = Reader::from_str(input);
    let mut writer = Writer::new(Vec::with_capacity(input.len()));

    let mut depth = 0usize;
    let mut saw_root = false;
    let mut entries_seen = 0usize;
    // Nesting level inside the current entry; 0 outside of entries.
    let mut entry_depth = 0usize;
    let mut skipping = false;

    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Start(start) => {
                saw_root |= depth == 0;
                depth += 1;
                if entry_depth > 0 {
                    entry_depth += 1;
                } else if is_entry(start.local_name().as_ref()) {
                    entry_depth = 1;
                    entries_seen += 1;
                    skipping = entries_seen > cap;
                }
            }
            Event::End(_) => {
                depth = depth.checked_sub(1).ok_or_else(|| {
                    FeedError::Malformed("closing tag without matching opening tag".to_string())
                })?;
                if entry_depth > 0 {
                    entry_depth -= 1;
                    if entry_depth == 0 && skipping {
                        skipping = false;
                        continue;
                    }
                }
            }
            Event::Empty(start) => {
                saw_root |= depth == 0;
                if entry_depth == 0 && is_entry(start.local_name().as_ref()) {
                    entries_seen += 1;
                    if entries_seen > cap {
                        continue;
                    }
                }
            }
            Event::Decl(_) => {
                writer
                    .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
                    .map_err(write_error)?;
                continue;
            }
            Event::Eof => break,
            _ => {}
        }

        if !skipping {
            writer.write_event(event).map_err(write_error)?;
        }
    }

    if depth > 0 {
        return Err(FeedError::Malformed("document ended inside an element".to_string()));
    }
    if !saw_root {
        return Err(FeedError::Malformed("no root element".to_string()));
    }
    String::from_utf8(writer.into_inner()).map_err(|e| FeedError::Malformed(e.to_string()))
}
