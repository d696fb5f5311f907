//! Data models shared by the normalizer, the pipeline and the outputs.
//!
//! This module defines the records produced by one run:
//! - [`NormalizedItem`]: one feed entry reduced to a uniform shape
//! - [`ItemDate`]: the canonical-or-sentinel date carried by every item
//! - [`SourceReportLine`]: the per-source outcome shown in the status report
//! - [`MirrorDocument`]: a source's raw feed, truncated to the cap
//! - [`RunResult`]: everything a run hands off to publishing

use serde::{Serialize, Serializer};
use std::fmt;

/// Placeholder for a value that is absent or could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// Canonical item date layout. Zero-padded and big-endian, so string order
/// equals chronological order.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// The date attached to a [`NormalizedItem`].
///
/// Serializes to a plain string: the canonical `YYYY-MM-DD HH:MM` form, the
/// raw feed value when neither date format matched, or `"N/A"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemDate {
    /// Parsed and reformatted to [`CANONICAL_DATE_FORMAT`].
    Normalized(String),
    /// Present in the feed but unparseable; kept verbatim.
    Raw(String),
    /// No date field at all.
    Missing,
}

impl ItemDate {
    pub fn as_str(&self) -> &str {
        match self {
            ItemDate::Normalized(s) | ItemDate::Raw(s) => s,
            ItemDate::Missing => NOT_AVAILABLE,
        }
    }

    /// The canonical form, if this date was successfully normalized.
    pub fn normalized(&self) -> Option<&str> {
        match self {
            ItemDate::Normalized(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ItemDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ItemDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One feed entry after normalization.
///
/// Created while normalizing a single document and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedItem {
    /// Label of the [`Source`](crate::sources::Source) the item came from.
    pub source: String,
    /// Entry title, `"No Title"` when absent.
    pub title: String,
    /// Entry link, `"N/A"` when absent.
    pub url: String,
    pub date: ItemDate,
    /// Tag-free description, at most 300 characters.
    pub desc: String,
}

/// Outcome category of one source in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    Empty,
    HttpError,
    ParseError,
    NetworkError,
}

impl SourceStatus {
    /// Leading marker used by the text report.
    pub fn icon(self) -> &'static str {
        match self {
            SourceStatus::Ok => "✅",
            SourceStatus::Empty => "⚠️",
            SourceStatus::HttpError => "❌",
            SourceStatus::ParseError => "🧩",
            SourceStatus::NetworkError => "🔌",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SourceStatus::Ok => "ok",
            SourceStatus::Empty => "empty",
            SourceStatus::HttpError => "http_error",
            SourceStatus::ParseError => "parse_error",
            SourceStatus::NetworkError => "network_error",
        }
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line of the status report; exactly one per source per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReportLine {
    pub source: String,
    pub status: SourceStatus,
    pub item_count: usize,
    /// Latest normalized date, or a short marker such as `"HTTP 500"`.
    pub latest_date: String,
    /// Error message for failed sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// A source's feed document, cut to its first `cap` entries and still
/// well-formed XML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MirrorDocument {
    pub source: String,
    pub url: String,
    pub xml: String,
}

/// Everything a single run produces, in source-list order.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RunResult {
    pub items: Vec<NormalizedItem>,
    pub report: Vec<SourceReportLine>,
    /// Only filled when the mirror artifact is enabled.
    pub mirror: Vec<MirrorDocument>,
}

impl RunResult {
    /// Whether any source contributed at least one item. Runs without items
    /// are not published.
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn count_with_status(&self, status: SourceStatus) -> usize {
        self.report.iter().filter(|l| l.status == status).count()
    }
}
