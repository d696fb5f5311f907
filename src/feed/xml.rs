//! Minimal owned element tree for feed documents.
//!
//! Feeds are small, so the whole document is read into a tree of
//! [`Element`]s with namespaces already resolved. Entry matching and field
//! extraction then work on plain data instead of reader events.

use quick_xml::{NsReader, Reader};
use std::borrow::Cow;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;

use super::FeedError;

/// A run of character data or a child, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Child(usize),
}

/// One XML element with its namespace resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Namespace URI the element's prefix (or default namespace) is bound to.
    pub namespace: Option<String>,
    /// Name without prefix, e.g. `date` for `dc:date`.
    pub local_name: String,
    /// Name as written in the document, e.g. `dc:date`.
    pub qualified_name: String,
    pub attributes: Vec<(String, String)>,
    /// Character data directly inside this element (CDATA included).
    pub text: String,
    pub children: Vec<Element>,
    /// Interleaving of `text` and `children` as they appeared.
    segments: Vec<Segment>,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Text of this element and all of its descendants, in document order.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Child(index) => self.children[*index].collect_text(out),
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
        match self.segments.last_mut() {
            Some(Segment::Text(run)) => run.push_str(text),
            _ => self.segments.push(Segment::Text(text.to_string())),
        }
    }

    fn push_child(&mut self, child: Element) {
        self.segments.push(Segment::Child(self.children.len()));
        self.children.push(child);
    }

    /// Depth-first, document-order search over all descendants (not `self`).
    pub fn descendants_matching<'a, P>(&'a self, pred: &P, out: &mut Vec<&'a Element>)
    where
        P: Fn(&Element) -> bool,
    {
        for child in &self.children {
            if pred(child) {
                out.push(child);
            }
            child.descendants_matching(pred, out);
        }
    }
}

/// Decode raw document bytes to text.
///
/// The byte order mark or the `encoding` of the XML declaration decides the
/// character set (ISO-8859-1, GBK, UTF-16, ...). Undeclared or undecodable
/// input falls back to lossy UTF-8.
pub fn decode_document(bytes: &[u8]) -> Cow<'_, str> {
    let mut reader = Reader::from_reader(bytes);
    // The reader switches its decoder once it has seen the declaration.
    loop {
        match reader.read_event() {
            Ok(Event::Text(_) | Event::Comment(_)) => continue,
            _ => break,
        }
    }
    match reader.decoder().decode(bytes) {
        Ok(text) => text,
        Err(_) => String::from_utf8_lossy(bytes),
    }
}

/// Parse a whole document into its root [`Element`].
///
/// Fails on malformed markup, mismatched or missing end tags, and input
/// without a root element.
pub fn parse_document(input: &str) -> Result<Element, FeedError> {
    let input = input.trim_start_matches('\u{FEFF}').trim_start();
    let mut reader = NsReader::from_str(input);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (resolved, event) = reader.read_resolved_event()?;
        let namespace = match resolved {
            ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.into_inner()).into_owned()),
            _ => None,
        };

        match event {
            Event::Start(start) => {
                stack.push(element_from_start(&start, namespace));
            }
            Event::Empty(start) => {
                let element = element_from_start(&start, namespace);
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    FeedError::Malformed("closing tag without matching opening tag".to_string())
                })?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&String::from_utf8_lossy(&text));
                }
            }
            Event::CData(cdata) => {
                if let Some(current) = stack.last_mut() {
                    current.push_text(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::GeneralRef(reference) => {
                if let Some(current) = stack.last_mut() {
                    let name = String::from_utf8_lossy(&reference).into_owned();
                    current.push_text(&resolve_reference(&name));
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctypes.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(FeedError::Malformed(format!(
            "document ended inside <{}>",
            open.qualified_name
        )));
    }
    root.ok_or_else(|| FeedError::Malformed("no root element".to_string()))
}

fn element_from_start(start: &BytesStart<'_>, namespace: Option<String>) -> Element {
    let qualified_name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let local_name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();

    let attributes = start
        .attributes()
        .with_checks(false)
        .flatten()
        .map(|attr| {
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let raw = String::from_utf8_lossy(&attr.value).into_owned();
            let value = match unescape(&raw) {
                Ok(v) => v.into_owned(),
                Err(_) => raw,
            };
            (key, value)
        })
        .collect();

    Element {
        namespace,
        local_name,
        qualified_name,
        attributes,
        ..Element::default()
    }
}

fn attach(
    element: Element,
    stack: &mut [Element],
    root: &mut Option<Element>,
) -> Result<(), FeedError> {
    match stack.last_mut() {
        Some(parent) => {
            parent.push_child(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(FeedError::Malformed(
            "more than one root element".to_string(),
        )),
    }
}

/// Resolve `&name;` to text. Character references and the five XML entities
/// are decoded; anything else (typically HTML entities like `&nbsp;`) is kept
/// verbatim so the description cleaner can decode it later.
fn resolve_reference(name: &str) -> String {
    if let Some(code) = name.strip_prefix('#') {
        let parsed = match code.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => code.parse::<u32>().ok(),
        };
        if let Some(ch) = parsed.and_then(char::from_u32) {
            return ch.to_string();
        }
    } else if let Some(resolved) = resolve_predefined_entity(name) {
        return resolved.to_string();
    }
    format!("&{name};")
}
