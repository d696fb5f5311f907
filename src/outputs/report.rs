//! Plain-text status report.
//!
//! One header line with the run timestamp, then one line per source and a
//! second, indented line for sources that failed:
//!
//! ```text
//! RSS status report @ 2024-03-05 09:30 UTC (2/3 sources ok, 7 items)
//! ✅ OpenAI | ok | items: 5 | latest: 2024-03-05 09:00
//! ❌ DeepMind | http_error | items: 0 | latest: HTTP 503
//!    ↳ server answered 503 for https://deepmind.google/blog/rss.xml
//! ✅ Karpathy | ok | items: 2 | latest: 2024-02-11 18:00
//! ```

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::models::{RunResult, SourceStatus};

pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Render the report for `result`, stamped with `run_at`.
pub fn render_report(result: &RunResult, run_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "RSS status report @ {} ({}/{} sources ok, {} items)",
        run_at.format("%Y-%m-%d %H:%M UTC"),
        result.count_with_status(SourceStatus::Ok),
        result.report.len(),
        result.items.len()
    );

    for line in &result.report {
        let _ = writeln!(
            out,
            "{} {} | {} | items: {} | latest: {}",
            line.status.icon(),
            line.source,
            line.status,
            line.item_count,
            line.latest_date
        );
        if let Some(detail) = &line.detail {
            let _ = writeln!(out, "   ↳ {detail}");
        }
    }
    out
}
