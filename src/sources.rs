//! The feed source table.
//!
//! The table is immutable for the run and passed into the pipeline
//! explicitly. It is either the built-in list below or a YAML file:
//!
//! ```yaml
//! - name: OpenAI
//!   url: https://openai.com/news/rss.xml
//! - name: DeepMind
//!   url: https://deepmind.google/blog/rss.xml
//! ```

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

/// One feed to poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Label attached to every item and report line from this feed.
    pub name: String,
    pub url: String,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

const DEFAULT_SOURCES: &[(&str, &str)] = &[
    ("OpenAI", "https://openai.com/news/rss.xml"),
    ("HuggingFace", "https://huggingface.co/blog/feed.xml"),
    ("DeepMind", "https://deepmind.google/blog/rss.xml"),
    ("Anthropic(TC)", "https://techcrunch.com/tag/anthropic/feed/"),
    ("Hacker News", "https://hnrss.org/newest?q=AI+OR+GPT+points=100"),
    ("Karpathy", "https://karpathy.bearblog.dev/feed/"),
    ("Sam Altman", "https://blog.samaltman.com/rss"),
    (
        "AI Explained",
        "https://www.youtube.com/feeds/videos.xml?channel_id=UCNJ1Ymd5yFuUPtn21xtRbbw",
    ),
    ("Jiqizhixin", "https://www.jiqizhixin.com/rss"),
];

/// The built-in source table.
pub fn default_sources() -> Vec<Source> {
    DEFAULT_SOURCES
        .iter()
        .map(|(name, url)| Source::new(*name, *url))
        .collect()
}

#[derive(Debug)]
pub enum SourcesError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Empty,
    InvalidUrl { name: String, url: String },
}

impl fmt::Display for SourcesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourcesError::Io(e) => write!(f, "could not read sources file: {e}"),
            SourcesError::Yaml(e) => write!(f, "could not parse sources file: {e}"),
            SourcesError::Empty => f.write_str("source list is empty"),
            SourcesError::InvalidUrl { name, url } => {
                write!(f, "source {name:?} has an invalid http(s) URL: {url}")
            }
        }
    }
}

impl Error for SourcesError {}

impl From<std::io::Error> for SourcesError {
    fn from(e: std::io::Error) -> Self {
        SourcesError::Io(e)
    }
}

impl From<serde_yaml::Error> for SourcesError {
    fn from(e: serde_yaml::Error) -> Self {
        SourcesError::Yaml(e)
    }
}

/// Parse and validate a YAML source list.
pub fn parse_sources(yaml: &str) -> Result<Vec<Source>, SourcesError> {
    let sources: Vec<Source> = serde_yaml::from_str(yaml)?;
    validate(&sources)?;
    Ok(sources)
}

/// Load the source table from `path`, or the built-in one when `None`.
///
/// # Arguments
///
/// * `path` - YAML file holding a list of `{ name, url }` records
///
/// # Returns
///
/// The sources in file order, or [`default_sources`] when `path` is `None`.
///
/// # Errors
///
/// Reading or parsing the file fails, the list is empty, or a URL is not
/// an absolute `http`/`https` URL.
#[instrument(level = "info")]
pub async fn load_sources(path: Option<&Path>) -> Result<Vec<Source>, SourcesError> {
    let sources = match path {
        Some(p) => parse_sources(&tokio::fs::read_to_string(p).await?)?,
        None => default_sources(),
    };
    info!(count = sources.len(), custom = path.is_some(), "Loaded source table");
    Ok(sources)
}

fn validate(sources: &[Source]) -> Result<(), SourcesError> {
    if sources.is_empty() {
        return Err(SourcesError::Empty);
    }
    for s in sources {
        let ok = Url::parse(&s.url)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !ok {
            return Err(SourcesError::InvalidUrl {
                name: s.name.clone(),
                url: s.url.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sources_are_valid() {
        let sources = default_sources();
        assert!(!sources.is_empty());
        assert!(validate(&sources).is_ok());
        assert_eq!(sources[0].name, "OpenAI");
    }

    #[test]
    fn test_parse_yaml_keeps_order() {
        let yaml = "- name: A\n  url: https://a.example/rss\n- name: B\n  url: http://b.example/atom.xml\n";
        let sources = parse_sources(yaml).unwrap();
        assert_eq!(sources, vec![
            Source::new("A", "https://a.example/rss"),
            Source::new("B", "http://b.example/atom.xml"),
        ]);
    }

    #[test]
    fn test_empty_list_rejected() {
        assert!(matches!(parse_sources("[]"), Err(SourcesError::Empty)));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = parse_sources("- name: Bad\n  url: ftp://example.com/feed\n").unwrap_err();
        assert!(matches!(err, SourcesError::InvalidUrl { ref name, .. } if name == "Bad"));

        let err = parse_sources("- name: Worse\n  url: not a url\n").unwrap_err();
        assert!(err.to_string().contains("Worse"));
    }

    #[test]
    fn test_malformed_yaml_rejected() {
        assert!(matches!(parse_sources("- name: [unterminated"), Err(SourcesError::Yaml(_))));
    }

    #[tokio::test]
    async fn test_load_without_path_uses_defaults() {
        let sources = load_sources(None).await.unwrap();
        assert_eq!(sources, default_sources());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("rss_mirror_sources_{}.yaml", std::process::id()));
        tokio::fs::write(&path, "- name: Local\n  url: https://local.example/feed\n").await.unwrap();
        let sources = load_sources(Some(&path)).await.unwrap();
        let _ = tokio::fs::remove_file(&path).await;
        assert_eq!(sources, vec![Source::new("Local", "https://local.example/feed")]);
    }
}
