//! The run loop: fetch every source in order, normalize, and account.
//!
//! Sources are processed strictly one after another. Each source is
//! attempted exactly once and always yields one [`SourceReportLine`]; no
//! failure ever ends the run early. A fixed courtesy delay separates
//! consecutive sources, whatever the previous outcome was.
//!
//! With [`PipelineOptions::mirror`] set, every source whose feed parsed also
//! contributes its document, truncated to the cap, to [`RunResult::mirror`].

use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

use crate::feed::{self, DEFAULT_CAP, ERROR_MARKER, FeedError};
use crate::fetch::FeedFetcher;
use crate::models::{MirrorDocument, NormalizedItem, RunResult, SourceReportLine, SourceStatus};
use crate::sources::Source;
use crate::utils::truncate_for_log;

pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Latest-date marker for sources that could not be reached.
pub const CONN_ERR_MARKER: &str = "Conn Err";

#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Maximum items kept per source.
    pub cap: usize,
    /// Pause between two consecutive sources.
    pub delay: Duration,
    /// Keep truncated copies of the raw documents for the mirror artifact.
    pub mirror: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            cap: DEFAULT_CAP,
            delay: DEFAULT_DELAY,
            mirror: false,
        }
    }
}

/// Outcome of one source, before it is folded into the [`RunResult`].
#[derive(Debug)]
struct SourceOutcome {
    items: Vec<NormalizedItem>,
    line: SourceReportLine,
    mirror: Option<MirrorDocument>,
}

/// Run the whole source list once.
///
/// # Arguments
///
/// * `sources` - Feeds to process, in order
/// * `fetcher` - Transport used for every request
/// * `options` - Per-source cap, inter-source delay and mirror switch
///
/// # Returns
///
/// A [`RunResult`] with the items of all sources in source-list order and
/// exactly one report line per source. Failures never end the run early;
/// they show up as report lines with a non-`ok` status.
#[instrument(level = "info", skip_all, fields(sources = sources.len(), cap = options.cap))]
pub async fn run_pipeline<F: FeedFetcher>(
    sources: &[Source],
    fetcher: &F,
    options: &PipelineOptions,
) -> RunResult {
    let mut result = RunResult::default();

    for (i, source) in sources.iter().enumerate() {
        if i > 0 && !options.delay.is_zero() {
            sleep(options.delay).await;
        }

        let outcome = process_source(source, fetcher, options).await;
        info!(
            source = %source.name,
            status = %outcome.line.status,
            items = outcome.line.item_count,
            latest = %outcome.line.latest_date,
            "Processed source"
        );
        result.items.extend(outcome.items);
        result.report.push(outcome.line);
        result.mirror.extend(outcome.mirror);
    }

    info!(
        items = result.items.len(),
        ok = result.count_with_status(SourceStatus::Ok),
        failed = result.report.len() - result.count_with_status(SourceStatus::Ok),
        "Pipeline finished"
    );
    result
}

async fn process_source<F: FeedFetcher>(source: &Source, fetcher: &F, options: &PipelineOptions) -> SourceOutcome {
    let response = match fetcher.fetch(&source.url).await {
        Ok(r) => r,
        Err(e) => {
            warn!(source = %source.name, timed_out = e.timed_out, error = %e, "Network failure");
            return failure(source, SourceStatus::NetworkError, CONN_ERR_MARKER.to_string(), e.to_string());
        }
    };

    if !response.is_ok() {
        warn!(source = %source.name, status = response.status, "Unexpected HTTP status");
        return failure(
            source,
            SourceStatus::HttpError,
            format!("HTTP {}", response.status),
            format!("server answered {} for {}", response.status, source.url),
        );
    }

    match feed::parse_feed(&response.body, &source.name, options.cap) {
        Ok(summary) => {
            let status = if summary.items.is_empty() {
                SourceStatus::Empty
            } else {
                SourceStatus::Ok
            };
            SourceOutcome {
                line: SourceReportLine {
                    source: source.name.clone(),
                    status,
                    item_count: summary.items.len(),
                    latest_date: summary.latest_date,
                    detail: None,
                },
                items: summary.items,
                mirror: options
                    .mirror
                    .then(|| mirror_document(source, &response.body, options.cap))
                    .flatten(),
            }
        }
        Err(FeedError::NoEntries) => {
            warn!(source = %source.name, "Feed has no entries");
            failure(source, SourceStatus::ParseError, ERROR_MARKER.to_string(), FeedError::NoEntries.to_string())
        }
        Err(e) => {
            warn!(
                source = %source.name,
                error = %e,
                body_preview = %truncate_for_log(&String::from_utf8_lossy(&response.body), 200),
                "Feed could not be parsed"
            );
            failure(source, SourceStatus::ParseError, ERROR_MARKER.to_string(), e.to_string())
        }
    }
}

fn mirror_document(source: &Source, body: &[u8], cap: usize) -> Option<MirrorDocument> {
    match feed::mirror::truncate_document(body, cap) {
        Ok(xml) => Some(MirrorDocument {
            source: source.name.clone(),
            url: source.url.clone(),
            xml,
        }),
        Err(e) => {
            warn!(source = %source.name, error = %e, "Feed could not be truncated for the mirror");
            None
        }
    }
}

fn failure(source: &Source, status: SourceStatus, latest_date: String, detail: String) -> SourceOutcome {
    SourceOutcome {
        items: Vec::new(),
        mirror: None,
        line: SourceReportLine {
            source: source.name.clone(),
            status,
            item_count: 0,
            latest_date,
            detail: Some(detail),
        },
    }
}
