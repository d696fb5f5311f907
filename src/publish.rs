//! Artifact publishing.
//!
//! The pipeline's output is stored through the narrow [`ObjectStore`]
//! interface: "store this named content". Two backends exist:
//!
//! | Backend | Type | Notes |
//! |---------|------|-------|
//! | Tencent COS / any S3 API | [`CosStore`] | `rust-s3`, virtual-host style bucket URLs |
//! | Local directory | [`LocalStore`] | dry runs and self-hosted mirrors |
//!
//! Every put overwrites whatever was stored under the key before. A failed
//! put is logged and the remaining artifacts are still attempted; nothing
//! is retried, the next scheduled run is the recovery.

use chrono::{DateTime, Utc};
use s3::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{error, info, instrument, warn};

use crate::config::{CosConfig, StorageTarget};
use crate::models::RunResult;
use crate::outputs::{json, mirror, report};
use crate::utils::ensure_writable_dir;

#[derive(Debug)]
pub struct StorageError {
    pub key: String,
    message: String,
}

impl StorageError {
    pub fn new(key: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            key: key.into(),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "storing {:?} failed: {}", self.key, self.message)
    }
}

impl Error for StorageError {}

/// Durable named-content storage.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    /// Store `body` under `key`, replacing any previous object.
    async fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), StorageError>;
}

/// S3-compatible bucket, Tencent COS by default.
pub struct CosStore {
    bucket: Box<Bucket>,
}

impl fmt::Debug for CosStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosStore")
            .field("bucket", &self.bucket.name())
            .finish()
    }
}

impl CosStore {
    pub fn new(config: &CosConfig) -> Result<Self, StorageError> {
        let credentials = Credentials::new(
            Some(config.secret_id.as_str()),
            Some(config.secret_key.as_str()),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::new("", format!("invalid credentials: {e}")))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::new("", format!("invalid bucket configuration: {e}")))?;
        Ok(Self { bucket })
    }
}

impl ObjectStore for CosStore {
    #[instrument(level = "info", skip(self, body), fields(bytes = body.len()))]
    async fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, body, content_type)
            .await
            .map_err(|e| StorageError::new(key, e))?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::new(key, format!("object store answered {status}")));
        }
        info!(status, "Uploaded object");
        Ok(())
    }
}

/// Writes each key as a file below `root`; `/` in keys becomes a subdirectory.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub async fn new(root: &Path) -> Result<Self, Box<dyn Error>> {
        ensure_writable_dir(root).await?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(StorageError::new(key, "key must be a plain relative path"));
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for LocalStore {
    #[instrument(level = "info", skip(self, body), fields(bytes = body.len()))]
    async fn put(&self, key: &str, body: &[u8], _content_type: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::new(key, e))?;
        }
        fs::write(&path, body)
            .await
            .map_err(|e| StorageError::new(key, e))?;
        info!(path = %path.display(), "Wrote object");
        Ok(())
    }
}

/// The configured backend.
#[derive(Debug)]
pub enum Store {
    Cos(CosStore),
    Local(LocalStore),
}

impl Store {
    pub async fn from_target(target: &StorageTarget) -> Result<Self, Box<dyn Error>> {
        Ok(match target {
            StorageTarget::Cos(config) => Store::Cos(CosStore::new(config)?),
            StorageTarget::LocalDir(dir) => Store::Local(LocalStore::new(dir).await?),
        })
    }
}

impl ObjectStore for Store {
    async fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), StorageError> {
        match self {
            Store::Cos(s) => s.put(key, body, content_type).await,
            Store::Local(s) => s.put(key, body, content_type).await,
        }
    }
}

/// Keys under which the artifacts are stored.
#[derive(Debug, Clone)]
pub struct ArtifactKeys {
    pub items: String,
    pub report: String,
    /// Raw feed mirror; not published when `None`.
    pub mirror: Option<String>,
}

/// Render and store the artifacts for `result`.
///
/// The item JSON goes first, then the status report, then (when a mirror
/// key is configured and some feed was mirrored) the raw feed mirror.
///
/// # Arguments
///
/// * `store` - Backend that receives every artifact
/// * `keys` - Object keys for each artifact
/// * `result` - Output of the pipeline run
/// * `run_at` - Timestamp printed in the report header
///
/// # Returns
///
/// The number of artifacts that were stored. Runs without any item are
/// skipped entirely and return 0. A failed put is logged and does not
/// prevent the remaining ones.
#[instrument(level = "info", skip_all, fields(items = result.items.len()))]
pub async fn publish_run<S: ObjectStore>(
    store: &S,
    keys: &ArtifactKeys,
    result: &RunResult,
    run_at: DateTime<Utc>,
) -> usize {
    if !result.has_items() {
        warn!("No usable items from any source; skipping publish");
        return 0;
    }

    let mut stored = 0;

    match json::render_items(&result.items) {
        Ok(body) => stored += put_logged(store, &keys.items, body.as_bytes(), json::CONTENT_TYPE).await,
        Err(e) => error!(error = %e, "Failed to serialize items"),
    }

    let text = report::render_report(result, run_at);
    stored += put_logged(store, &keys.report, text.as_bytes(), report::CONTENT_TYPE).await;

    if let Some(mirror_key) = &keys.mirror {
        if result.mirror.is_empty() {
            warn!(%mirror_key, "No feed could be mirrored; skipping mirror");
        } else {
            let text = mirror::render_mirror(&result.mirror);
            stored += put_logged(store, mirror_key, text.as_bytes(), mirror::CONTENT_TYPE).await;
        }
    }

    info!(stored, "Publish finished");
    stored
}

async fn put_logged<S: ObjectStore>(store: &S, key: &str, body: &[u8], content_type: &str) -> usize {
    match store.put(key, body, content_type).await {
        Ok(()) => 1,
        Err(e) => {
            error!(%key, error = %e, "Failed to store artifact");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemDate, MirrorDocument, NormalizedItem, SourceReportLine, SourceStatus};
    use chrono::TimeZone;
    use std::cell::RefCell;

    /// Records puts; fails for keys listed in `failing`.
    #[derive(Default)]
    struct MemoryStore {
        objects: RefCell<Vec<(String, String, String)>>,
        failing: Vec<String>,
    }

    impl ObjectStore for MemoryStore {
        async fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<(), StorageError> {
            if self.failing.iter().any(|k| k == key) {
                return Err(StorageError::new(key, "access denied"));
            }
            self.objects.borrow_mut().push((
                key.to_string(),
                String::from_utf8_lossy(body).into_owned(),
                content_type.to_string(),
            ));
            Ok(())
        }
    }

    fn keys() -> ArtifactKeys {
        ArtifactKeys {
            items: "rss_mirror.json".to_string(),
            report: "rss_status.txt".to_string(),
            mirror: None,
        }
    }

    fn keys_with_mirror() -> ArtifactKeys {
        ArtifactKeys {
            mirror: Some("rss_mirror.txt".to_string()),
            ..keys()
        }
    }

    fn run_with_items(n: usize) -> RunResult {
        RunResult {
            items: (0..n)
                .map(|i| NormalizedItem {
                    source: "OpenAI".to_string(),
                    title: format!("Item {i}"),
                    url: format!("https://openai.com/{i}"),
                    date: ItemDate::Missing,
                    desc: String::new(),
                })
                .collect(),
            report: vec![SourceReportLine {
                source: "OpenAI".to_string(),
                status: if n > 0 { SourceStatus::Ok } else { SourceStatus::Empty },
                item_count: n,
                latest_date: "N/A".to_string(),
                detail: None,
            }],
            ..Default::default()
        }
    }

    fn run_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 9, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn test_publishes_both_artifacts() {
        let store = MemoryStore::default();
        let stored = publish_run(&store, &keys(), &run_with_items(2), run_at()).await;

        assert_eq!(stored, 2);
        let objects = store.objects.borrow();
        assert_eq!(objects[0].0, "rss_mirror.json");
        assert_eq!(objects[0].2, json::CONTENT_TYPE);
        assert!(objects[0].1.contains("Item 1"));
        assert_eq!(objects[1].0, "rss_status.txt");
        assert_eq!(objects[1].2, report::CONTENT_TYPE);
        assert!(objects[1].1.starts_with("RSS status report @ 2024-03-05 09:30 UTC"));
    }

    #[tokio::test]
    async fn test_publishes_mirror_when_configured() {
        let mut result = run_with_items(1);
        result.mirror.push(MirrorDocument {
            source: "OpenAI".to_string(),
            url: "https://openai.com/news/rss.xml".to_string(),
            xml: "<rss><channel/></rss>".to_string(),
        });

        let store = MemoryStore::default();
        let stored = publish_run(&store, &keys_with_mirror(), &result, run_at()).await;

        assert_eq!(stored, 3);
        let objects = store.objects.borrow();
        assert_eq!(objects[2].0, "rss_mirror.txt");
        assert_eq!(objects[2].2, mirror::CONTENT_TYPE);
        assert!(objects[2].1.contains("<<<<SOURCE_START:https://openai.com/news/rss.xml>>>>\n<rss><channel/></rss>\n<<<<SOURCE_END>>>>"));

        let store = MemoryStore::default();
        assert_eq!(publish_run(&store, &keys(), &result, run_at()).await, 2);
    }

    #[tokio::test]
    async fn test_mirror_key_without_documents_stores_nothing_extra() {
        let store = MemoryStore::default();
        let stored = publish_run(&store, &keys_with_mirror(), &run_with_items(1), run_at()).await;
        assert_eq!(stored, 2);
        assert!(store.objects.borrow().iter().all(|(k, _, _)| k != "rss_mirror.txt"));
    }

    #[tokio::test]
    async fn test_skips_publish_without_items() {
        let store = MemoryStore::default();
        let stored = publish_run(&store, &keys(), &run_with_items(0), run_at()).await;
        assert_eq!(stored, 0);
        assert!(store.objects.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_failed_put_does_not_stop_the_next() {
        let store = MemoryStore {
            failing: vec!["rss_mirror.json".to_string()],
            ..Default::default()
        };
        let stored = publish_run(&store, &keys(), &run_with_items(1), run_at()).await;
        assert_eq!(stored, 1);
        assert_eq!(store.objects.borrow()[0].0, "rss_status.txt");
    }

    #[tokio::test]
    async fn test_local_store_writes_and_overwrites() {
        let dir = std::env::temp_dir().join(format!("rss_mirror_publish_{}", std::process::id()));
        let store = LocalStore::new(&dir).await.unwrap();

        store.put("nested/a.txt", b"first", "text/plain").await.unwrap();
        store.put("nested/a.txt", b"second", "text/plain").await.unwrap();
        let content = tokio::fs::read_to_string(dir.join("nested/a.txt")).await.unwrap();
        assert_eq!(content, "second");

        assert!(store.put("../escape.txt", b"x", "text/plain").await.is_err());
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[test]
    fn test_cos_store_builds_from_config() {
        let config = CosConfig {
            secret_id: "id".to_string(),
            secret_key: "key".to_string(),
            region: "ap-guangzhou".to_string(),
            bucket: "mirror-1250000000".to_string(),
            endpoint: "https://cos.ap-guangzhou.myqcloud.com".to_string(),
        };
        let store = CosStore::new(&config).unwrap();
        assert!(format!("{store:?}").contains("mirror-1250000000"));
    }
}
