//! Run configuration, resolved once at startup.
//!
//! The CLI (and the environment variables behind it) are turned into a
//! validated [`RunConfig`] before anything is fetched. Object storage needs
//! four values; if any is missing the run aborts with an error naming all
//! of them, unless artifacts go to a local directory instead.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::pipeline::PipelineOptions;

/// Credentials and location of the COS / S3-compatible bucket.
#[derive(Clone, PartialEq, Eq)]
pub struct CosConfig {
    pub secret_id: String,
    pub secret_key: String,
    pub region: String,
    pub bucket: String,
    /// Service endpoint; `https://cos.<region>.myqcloud.com` when not given.
    pub endpoint: String,
}

// Hand-written so the secret key never ends up in logs.
impl fmt::Debug for CosConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosConfig")
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"***")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Where artifacts are published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    Cos(CosConfig),
    LocalDir(PathBuf),
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub storage: StorageTarget,
    pub pipeline: PipelineOptions,
    pub fetch_timeout: Duration,
    pub sources_file: Option<PathBuf>,
    pub items_key: String,
    pub report_key: String,
    /// Key of the raw feed mirror; `None` disables it.
    pub mirror_key: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Required settings that were not provided, by environment variable name.
    Missing(Vec<&'static str>),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(names) => {
                write!(f, "missing required configuration: {}", names.join(", "))
            }
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl Error for ConfigError {}

impl RunConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        if cli.cap == 0 {
            return Err(ConfigError::Invalid("--cap must be at least 1".to_string()));
        }
        let blank_mirror_key = cli.mirror_key.as_deref().is_some_and(|k| k.trim().is_empty());
        if cli.items_key.trim().is_empty() || cli.report_key.trim().is_empty() || blank_mirror_key {
            return Err(ConfigError::Invalid("artifact keys must not be empty".to_string()));
        }

        let storage = match &cli.local_dir {
            Some(dir) => StorageTarget::LocalDir(dir.clone()),
            None => StorageTarget::Cos(resolve_cos(cli)?),
        };

        Ok(Self {
            storage,
            pipeline: PipelineOptions {
                cap: cli.cap,
                delay: Duration::from_millis(cli.delay_ms),
                mirror: cli.mirror_key.is_some(),
            },
            fetch_timeout: Duration::from_secs(cli.timeout_secs),
            sources_file: cli.sources.clone(),
            items_key: cli.items_key.clone(),
            report_key: cli.report_key.clone(),
            mirror_key: cli.mirror_key.clone(),
        })
    }
}

fn resolve_cos(cli: &Cli) -> Result<CosConfig, ConfigError> {
    fn present(v: &Option<String>) -> Option<String> {
        v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
    }

    let secret_id = present(&cli.secret_id);
    let secret_key = present(&cli.secret_key);
    let region = present(&cli.region);
    let bucket = present(&cli.bucket);

    let missing: Vec<&'static str> = [
        ("TENCENT_SECRET_ID", secret_id.is_none()),
        ("TENCENT_SECRET_KEY", secret_key.is_none()),
        ("COS_REGION", region.is_none()),
        ("COS_BUCKET", bucket.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    match (secret_id, secret_key, region, bucket) {
        (Some(secret_id), Some(secret_key), Some(region), Some(bucket)) => {
            let endpoint = present(&cli.endpoint)
                .unwrap_or_else(|| format!("https://cos.{region}.myqcloud.com"));
            Ok(CosConfig {
                secret_id,
                secret_key,
                region,
                bucket,
                endpoint,
            })
        }
        _ => Err(ConfigError::Missing(missing)),
    }
}
