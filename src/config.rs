//! # Labeling Configuration
//!
//! A single [`LabelingConfig`] value is built at startup and handed to every component
//! that needs it. Sources, lowest to highest precedence:
//!
//! 1. Built-in defaults
//! 2. Optional TOML file
//! 3. Environment variables
//!
//! | Variable                      | Key                        | Required |
//! |-------------------------------|----------------------------|----------|
//! | `INEO_MAPPING`                | `mapping_url`              | yes      |
//! | `SOLR_URL`                    | `index.base_url`           | yes      |
//! | `SOLR_USER`                   | `index.username`           | yes      |
//! | `SOLR_PASSWORD`               | `index.password`           | yes      |
//! | `LABELING_QUERY`              | `index.query`              | no       |
//! | `LABELING_FLAG_FIELD`         | `index.flag_field`         | no       |
//! | `LABELING_PAGE_SIZE`          | `index.page_size`          | no       |
//! | `LABELING_COMMIT_WITHIN_MS`   | `index.commit_within_ms`   | no       |
//! | `LABELING_REQUEST_TIMEOUT_MS` | `index.request_timeout_ms` | no       |
//! | `LABELING_MAX_RETRIES`        | `index.max_retries`        | no       |
//! | `LABELING_RETRY_BACKOFF_MS`   | `index.retry_backoff_ms`   | no       |
//! | `LABELING_WORKERS`            | `workers`                  | no       |
//! | `LABELING_DRY_RUN`            | `dry_run`                  | no       |

use config::{Config, File, FileFormat};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{LabelingError, LabelingResult};
use crate::index::RetryPolicy;

pub const DEFAULT_QUERY: &str = "*:*";
pub const DEFAULT_FLAG_FIELD: &str = "ineo_record";
pub const DEFAULT_PAGE_SIZE: u64 = 10_000;
pub const DEFAULT_COMMIT_WITHIN_MS: u64 = 1_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_RETRIES: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("mapping_url", "INEO_MAPPING"),
    ("index.base_url", "SOLR_URL"),
    ("index.username", "SOLR_USER"),
    ("index.password", "SOLR_PASSWORD"),
    ("index.query", "LABELING_QUERY"),
    ("index.flag_field", "LABELING_FLAG_FIELD"),
    ("index.page_size", "LABELING_PAGE_SIZE"),
    ("index.commit_within_ms", "LABELING_COMMIT_WITHIN_MS"),
    ("index.request_timeout_ms", "LABELING_REQUEST_TIMEOUT_MS"),
    ("index.max_retries", "LABELING_MAX_RETRIES"),
    ("index.retry_backoff_ms", "LABELING_RETRY_BACKOFF_MS"),
    ("workers", "LABELING_WORKERS"),
    ("dry_run", "LABELING_DRY_RUN"),
];

/// Run configuration
///
/// # Examples
///
/// ```rust
/// use ineo_labeling::config::LabelingConfig;
/// use std::collections::HashMap;
///
/// let env: HashMap<&str, &str> = HashMap::from([
///     ("INEO_MAPPING", "https://example.org/mapping.xml"),
///     ("SOLR_URL", "http://localhost:8983/solr/records"),
///     ("SOLR_USER", "labeler"),
///     ("SOLR_PASSWORD", "secret"),
/// ]);
///
/// let config = LabelingConfig::load_with(None, |key| env.get(key).map(|v| v.to_string())).unwrap();
/// assert_eq!(config.index.page_size, 10_000);
/// assert_eq!(config.index.flag_field, "ineo_record");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelingConfig {
    /// Location of the provider mapping document
    pub mapping_url: String,
    /// Search index connection and protocol settings
    pub index: IndexConfig,
    /// Maximum number of concurrent page reads or updates
    pub workers: usize,
    /// Resolve and report without writing to the index
    pub dry_run: bool,
}

/// Search index settings
#[derive(Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
    pub query: String,
    pub flag_field: String,
    pub page_size: u64,
    pub commit_within_ms: u64,
    pub request_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl std::fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[MASKED]")
            .field("query", &self.query)
            .field("flag_field", &self.flag_field)
            .field("page_size", &self.page_size)
            .field("commit_within_ms", &self.commit_within_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .finish()
    }
}

impl IndexConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_backoff_ms))
    }
}

/// Shape read from the sources before required values are checked
#[derive(Debug, Deserialize)]
struct RawConfig {
    mapping_url: Option<String>,
    index: RawIndexConfig,
    workers: usize,
    dry_run: bool,
}

#[derive(Debug, Deserialize)]
struct RawIndexConfig {
    base_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    query: String,
    flag_field: String,
    page_size: u64,
    commit_within_ms: u64,
    request_timeout_ms: u64,
    max_retries: u32,
    retry_backoff_ms: u64,
}

/// Default worker count: the machine's available parallelism
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4)
}

impl LabelingConfig {
    /// Load from the process environment and an optional TOML file
    pub fn load(config_file: Option<&Path>) -> LabelingResult<Self> {
        Self::load_with(config_file, |key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the process environment
    pub fn load_with<F>(config_file: Option<&Path>, lookup: F) -> LabelingResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Config::builder()
            .set_default("index.query", DEFAULT_QUERY)?
            .set_default("index.flag_field", DEFAULT_FLAG_FIELD)?
            .set_default("index.page_size", DEFAULT_PAGE_SIZE as i64)?
            .set_default("index.commit_within_ms", DEFAULT_COMMIT_WITHIN_MS as i64)?
            .set_default("index.request_timeout_ms", DEFAULT_REQUEST_TIMEOUT_MS as i64)?
            .set_default("index.max_retries", i64::from(DEFAULT_MAX_RETRIES))?
            .set_default("index.retry_backoff_ms", DEFAULT_RETRY_BACKOFF_MS as i64)?
            .set_default("workers", default_workers() as i64)?
            .set_default("dry_run", false)?;

        if let Some(path) = config_file {
            debug!(path = %path.display(), "Loading labeling config file");
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        for (key, variable) in ENV_OVERRIDES {
            let value = lookup(variable).filter(|v| !v.trim().is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        let raw: RawConfig = builder.build()?.try_deserialize()?;
        let config = Self::from_raw(raw)?;
        config.validate()?;

        debug!(config = ?config, "Loaded labeling configuration");
        Ok(config)
    }

    fn from_raw(raw: RawConfig) -> LabelingResult<Self> {
        let required = |value: Option<String>, variable: &str| {
            value.filter(|v| !v.trim().is_empty()).ok_or_else(|| {
                LabelingError::config_error(format!(
                    "missing required parameter {variable}"
                ))
            })
        };

        Ok(Self {
            mapping_url: required(raw.mapping_url, "INEO_MAPPING")?,
            index: IndexConfig {
                base_url: required(raw.index.base_url, "SOLR_URL")?,
                username: required(raw.index.username, "SOLR_USER")?,
                password: required(raw.index.password, "SOLR_PASSWORD")?,
                query: raw.index.query,
                flag_field: raw.index.flag_field,
                page_size: raw.index.page_size,
                commit_within_ms: raw.index.commit_within_ms,
                request_timeout_ms: raw.index.request_timeout_ms,
                max_retries: raw.index.max_retries,
                retry_backoff_ms: raw.index.retry_backoff_ms,
            },
            workers: raw.workers,
            dry_run: raw.dry_run,
        })
    }

    /// Check values that deserialization alone cannot rule out
    pub fn validate(&self) -> LabelingResult<()> {
        Url::parse(&self.index.base_url).map_err(|e| {
            LabelingError::config_error(format!(
                "invalid index base URL '{}': {e}",
                self.index.base_url
            ))
        })?;

        if self.index.query.trim().is_empty() {
            return Err(LabelingError::config_error("index query must not be empty"));
        }
        if self.index.flag_field.trim().is_empty() {
            return Err(LabelingError::config_error("flag field must not be empty"));
        }
        if self.index.page_size == 0 {
            return Err(LabelingError::config_error("page size must be positive"));
        }
        if self.workers == 0 {
            return Err(LabelingError::config_error("worker count must be positive"));
        }
        if self.index.request_timeout_ms == 0 {
            return Err(LabelingError::config_error("request timeout must be positive"));
        }

        Ok(())
    }
}
