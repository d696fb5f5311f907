//! Description cleaning.

use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum description length, in characters.
pub const MAX_DESC_CHARS: usize = 300;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static RE_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]*[\r\n]+[ \t]*").unwrap());

/// Strip tags, decode HTML entities, fold line breaks into single spaces,
/// trim, and cut to [`MAX_DESC_CHARS`] characters.
///
/// Tags are removed before decoding, so an escaped `&lt;` in the text comes
/// out as a literal `<` instead of opening a bogus tag.
pub fn clean_description(raw: &str) -> String {
    let stripped = RE_TAGS.replace_all(raw, "");
    let decoded = html_escape::decode_html_entities(&stripped);
    let single_line = RE_NEWLINES.replace_all(&decoded, " ");
    truncate_chars(single_line.trim(), MAX_DESC_CHARS)
}

/// Cut `s` to at most `max` characters without splitting a code point.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
