//! Command-line interface definitions for RSS Mirror.
//!
//! All options can be provided via command-line flags or environment
//! variables, so the binary runs unchanged from a CI job where credentials
//! are injected as secrets.

use clap::Parser;
use std::path::PathBuf;

use crate::feed::DEFAULT_CAP;
use crate::fetch::DEFAULT_TIMEOUT;
use crate::pipeline::DEFAULT_DELAY;

/// Command-line arguments for the RSS Mirror application.
///
/// # Examples
///
/// ```sh
/// # Publish to COS, credentials from the environment
/// TENCENT_SECRET_ID=... TENCENT_SECRET_KEY=... COS_REGION=ap-guangzhou COS_BUCKET=mirror-125 rss_mirror
///
/// # Dry run into a local directory with a custom source list
/// rss_mirror --local-dir ./out --sources feeds.yaml --cap 3
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// COS / S3 access key id
    #[arg(long, env = "TENCENT_SECRET_ID", hide_env_values = true)]
    pub secret_id: Option<String>,

    /// COS / S3 secret access key
    #[arg(long, env = "TENCENT_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,

    /// Bucket region, e.g. ap-guangzhou
    #[arg(long, env = "COS_REGION")]
    pub region: Option<String>,

    /// Bucket name (for COS including the app id suffix)
    #[arg(long, env = "COS_BUCKET")]
    pub bucket: Option<String>,

    /// Storage endpoint; defaults to https://cos.<region>.myqcloud.com
    #[arg(long, env = "COS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Write artifacts to this directory instead of object storage
    #[arg(short, long, env = "RSS_MIRROR_LOCAL_DIR")]
    pub local_dir: Option<PathBuf>,

    /// YAML file with the source list (name/url pairs); built-in list otherwise
    #[arg(short, long, env = "RSS_MIRROR_SOURCES")]
    pub sources: Option<PathBuf>,

    /// Maximum number of items kept per source
    #[arg(short, long, default_value_t = DEFAULT_CAP)]
    pub cap: usize,

    /// Pause between two sources, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DELAY.as_millis() as u64)]
    pub delay_ms: u64,

    /// Per-request fetch timeout, in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT.as_secs())]
    pub timeout_secs: u64,

    /// Object key for the JSON item aggregate
    #[arg(long, default_value = "rss_mirror.json")]
    pub items_key: String,

    /// Object key for the text status report
    #[arg(long, default_value = "rss_status.txt")]
    pub report_key: String,

    /// Also publish the raw feeds, truncated to the cap, under this key
    /// (e.g. rss_mirror.txt); no mirror is written when unset
    #[arg(short, long, env = "RSS_MIRROR_MIRROR_KEY")]
    pub mirror_key: Option<String>,
}
