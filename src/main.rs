//! # RSS Mirror
//!
//! Fetches a fixed list of RSS/Atom feeds, keeps the most recent items of
//! each, and publishes a JSON digest plus a plain-text status report to
//! object storage (Tencent COS or any S3-compatible bucket).
//!
//! ## Usage
//!
//! ```sh
//! TENCENT_SECRET_ID=... TENCENT_SECRET_KEY=... COS_REGION=ap-guangzhou COS_BUCKET=mirror-125 rss_mirror
//! rss_mirror --local-dir ./out
//! ```
//!
//! ## Architecture
//!
//! One invocation is one run:
//! 1. **Configuration**: resolve storage settings; anything missing aborts here
//! 2. **Pipeline**: fetch each source in order, one at a time, with a pause between
//! 3. **Normalization**: reduce each feed to at most `cap` uniform items
//! 4. **Publishing**: store the item JSON, the report and (optionally) the raw
//!    feed mirror, unless no source produced items

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

use rss_mirror::cli::Cli;
use rss_mirror::config::RunConfig;
use rss_mirror::fetch::HttpFetcher;
use rss_mirror::outputs::report::render_report;
use rss_mirror::pipeline::run_pipeline;
use rss_mirror::publish::{ArtifactKeys, Store, publish_run};
use rss_mirror::sources::load_sources;

#[tokio::main(flavor = "current_thread")]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let run_at = Utc::now();
    info!("rss_mirror starting up");

    let args = Cli::parse();
    debug!(?args.local_dir, ?args.sources, cap = args.cap, "Parsed CLI arguments");

    // ---- Configuration: fatal before any fetch ----
    let config = match RunConfig::from_cli(&args) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Configuration incomplete; aborting");
            return Err(e.into());
        }
    };
    debug!(?config, "Resolved run configuration");

    let sources = load_sources(config.sources_file.as_deref()).await?;
    let store = Store::from_target(&config.storage).await?;
    let fetcher = HttpFetcher::new(config.fetch_timeout)?;

    // ---- Fetch and normalize ----
    let result = run_pipeline(&sources, &fetcher, &config.pipeline).await;
    print!("{}", render_report(&result, run_at));

    // ---- Publish ----
    let keys = ArtifactKeys {
        items: config.items_key.clone(),
        report: config.report_key.clone(),
        mirror: config.mirror_key.clone(),
    };
    let stored = publish_run(&store, &keys, &result, run_at).await;

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        items = result.items.len(),
        artifacts = stored,
        "Execution complete"
    );

    Ok(())
}
