//! Feed dialect detection.
//!
//! No format hint is needed up front: each [`Dialect`] knows which element
//! marks an entry, and the dialects are tried in [`Dialect::PRIORITY`] order.
//! The first one with at least one hit decides the entry list.

use super::xml::Element;

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
pub const RSS1_NS: &str = "http://purl.org/rss/1.0/";
pub const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
pub const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";

/// A tag to look for: either un-namespaced or bound to a namespace URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// No namespace. Also matches a literal prefixed name such as `dc:date`
    /// when the prefix was never declared.
    Bare(&'static str),
    Ns(&'static str, &'static str),
}

impl Tag {
    pub fn matches(self, element: &Element) -> bool {
        match self {
            Tag::Bare(name) => element.namespace.is_none() && element.qualified_name == name,
            Tag::Ns(ns, local) => {
                element.namespace.as_deref() == Some(ns) && element.local_name == local
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// RSS 2.0 `<item>`.
    Rss2,
    /// `<entry>` in the Atom namespace.
    Atom,
    /// `<entry>` without a namespace declaration.
    BareAtom,
    /// RSS 1.0 / RDF `<item>`.
    Rss1,
}

impl Dialect {
    pub const PRIORITY: [Dialect; 4] = [Dialect::Rss2, Dialect::Atom, Dialect::BareAtom, Dialect::Rss1];

    pub fn entry_tag(self) -> Tag {
        match self {
            Dialect::Rss2 => Tag::Bare("item"),
            Dialect::Atom => Tag::Ns(ATOM_NS, "entry"),
            Dialect::BareAtom => Tag::Bare("entry"),
            Dialect::Rss1 => Tag::Ns(RSS1_NS, "item"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dialect::Rss2 => "rss2",
            Dialect::Atom => "atom",
            Dialect::BareAtom => "atom-bare",
            Dialect::Rss1 => "rss1",
        }
    }
}

/// Find the entry elements of `root`, in document order.
///
/// Returns `None` when no dialect matches anything.
pub fn find_entries(root: &Element) -> Option<(Dialect, Vec<&Element>)> {
    Dialect::PRIORITY.into_iter().find_map(|dialect| {
        let tag = dialect.entry_tag();
        let mut hits = Vec::new();
        if tag.matches(root) {
            hits.push(root);
        }
        root.descendants_matching(&|e: &Element| tag.matches(e), &mut hits);
        (!hits.is_empty()).then_some((dialect, hits))
    })
}
