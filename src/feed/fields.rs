//! Per-field extraction from one entry element.
//!
//! Each field has an ordered list of candidate tags; the first candidate that
//! yields non-empty text wins.

use super::dialect::{ATOM_NS, CONTENT_NS, DC_NS, RSS1_NS, Tag};
use super::xml::Element;

pub const DEFAULT_TITLE: &str = "No Title";

const TITLE_TAGS: &[Tag] = &[
    Tag::Bare("title"),
    Tag::Ns(ATOM_NS, "title"),
    Tag::Ns(RSS1_NS, "title"),
];

/// Links carried as element text (RSS 2.0, RSS 1.0).
const LINK_TEXT_TAGS: &[Tag] = &[Tag::Bare("link"), Tag::Ns(RSS1_NS, "link")];

/// Links carried in an `href` attribute (Atom, namespaced or not).
const LINK_HREF_TAGS: &[Tag] = &[Tag::Ns(ATOM_NS, "link"), Tag::Bare("link")];

const DATE_TAGS: &[Tag] = &[
    Tag::Bare("pubDate"),
    Tag::Ns(ATOM_NS, "published"),
    Tag::Bare("published"),
    Tag::Ns(ATOM_NS, "updated"),
    Tag::Bare("updated"),
    Tag::Ns(DC_NS, "date"),
    Tag::Bare("dc:date"),
];

const DESCRIPTION_TAGS: &[Tag] = &[
    Tag::Bare("description"),
    Tag::Ns(RSS1_NS, "description"),
    Tag::Ns(ATOM_NS, "summary"),
    Tag::Bare("summary"),
    Tag::Ns(ATOM_NS, "content"),
    Tag::Bare("content"),
    Tag::Ns(CONTENT_NS, "encoded"),
];

/// First non-empty text among direct children matching `tags`, tried in order.
pub fn first_text(entry: &Element, tags: &[Tag]) -> Option<String> {
    tags.iter().find_map(|tag| {
        entry
            .children
            .iter()
            .filter(|child| tag.matches(child))
            .map(|child| child.text_content().trim().to_string())
            .find(|text| !text.is_empty())
    })
}

pub fn title(entry: &Element) -> String {
    first_text(entry, TITLE_TAGS).unwrap_or_else(|| DEFAULT_TITLE.to_string())
}

/// The entry link, or `None` when neither a text link nor an `href` exists.
///
/// Among `href` links, `rel="alternate"` (or no `rel`) is preferred over
/// `self`, `enclosure` and friends.
pub fn link(entry: &Element) -> Option<String> {
    if let Some(text) = first_text(entry, LINK_TEXT_TAGS) {
        return Some(text);
    }

    let candidates: Vec<(&Element, &str)> = LINK_HREF_TAGS
        .iter()
        .flat_map(|tag| entry.children.iter().filter(move |c| tag.matches(c)))
        .filter_map(|c| {
            c.attribute("href")
                .map(str::trim)
                .filter(|href| !href.is_empty())
                .map(|href| (c, href))
        })
        .collect();

    candidates
        .iter()
        .find(|(c, _)| matches!(c.attribute("rel"), None | Some("alternate")))
        .or_else(|| candidates.first())
        .map(|(_, href)| href.to_string())
}

/// Raw text of the first date field present.
pub fn raw_date(entry: &Element) -> Option<String> {
    first_text(entry, DATE_TAGS)
}

/// Raw (uncleaned) text of the first description field present.
pub fn raw_description(entry: &Element) -> Option<String> {
    first_text(entry, DESCRIPTION_TAGS)
}
