//! Artifact rendering.
//!
//! A run produces up to three artifacts, all rendered in memory and handed
//! to [`crate::publish`]:
//!
//! - [`json`]: the aggregate of normalized items (`rss_mirror.json` by default)
//! - [`report`]: the plain-text per-source status report (`rss_status.txt`)
//! - [`mirror`]: the raw feeds, truncated to the cap (only with `--mirror-key`)

pub mod json;
pub mod mirror;
pub mod report;
