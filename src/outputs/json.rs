//! JSON rendering of the aggregate item list.
//!
//! The output is a pretty-printed array of item records in run order
//! (source-list order, then feed document order). `serde_json` writes
//! non-ASCII characters literally, so titles in any script stay readable.
//!
//! ```text
//! [
//!   {
//!     "source": "OpenAI",
//!     "title": "Introducing ...",
//!     "url": "https://openai.com/index/...",
//!     "date": "2024-03-05 09:00",
//!     "desc": "..."
//!   }
//! ]
//! ```

use crate::models::NormalizedItem;

pub const CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Serialize `items` to UTF-8 JSON.
///
/// # Arguments
///
/// * `items` - All normalized items of the run, in run order
///
/// # Returns
///
/// A pretty-printed JSON array, `[]` for an empty run.
///
/// # Errors
///
/// Only if `serde_json` fails to serialize a record, which plain strings
/// never trigger.
pub fn render_items(items: &[NormalizedItem]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(items)
}
