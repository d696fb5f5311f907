//! Raw feed mirror.
//!
//! Every mirrored source is framed by start and end markers so a downstream
//! reader can split the file back into documents:
//!
//! ```text
//!
//!
//! <<<<SOURCE_START:https://openai.com/news/rss.xml>>>>
//! <?xml version="1.0" encoding="UTF-8"?><rss ...>...</rss>
//! <<<<SOURCE_END>>>>
//! ```

use std::fmt::Write;

use crate::models::MirrorDocument;

pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Concatenate `documents` in run order, each wrapped in source markers.
pub fn render_mirror(documents: &[MirrorDocument]) -> String {
    let mut out = String::new();
    for doc in documents {
        let _ = write!(
            out,
            "\n\n<<<<SOURCE_START:{}>>>>\n{}\n<<<<SOURCE_END>>>>\n",
            doc.url, doc.xml
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(url: &str, xml: &str) -> MirrorDocument {
        MirrorDocument {
            source: "S".to_string(),
            url: url.to_string(),
            xml: xml.to_string(),
        }
    }

    #[test]
    fn test_documents_are_framed_in_order() {
        let text = render_mirror(&[
            doc("https://a.example/rss", "<rss/>"),
            doc("https://b.example/atom", "<feed/>"),
        ]);
        assert_eq!(
            text,
            "\n\n<<<<SOURCE_START:https://a.example/rss>>>>\n<rss/>\n<<<<SOURCE_END>>>>\n\
             \n\n<<<<SOURCE_START:https://b.example/atom>>>>\n<feed/>\n<<<<SOURCE_END>>>>\n"
        );
    }

    #[test]
    fn test_nothing_to_mirror() {
        assert_eq!(render_mirror(&[]), "");
    }
}
