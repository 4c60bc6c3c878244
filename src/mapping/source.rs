//! # Mapping Source
//!
//! Retrieves the raw mapping document. The bytes are cached inside the fetcher, so a
//! fetcher fetches at most once; the orchestrator owns one fetcher per run and the
//! cache is dropped with it.

use async_trait::async_trait;
use reqwest::{Client, Url};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::error::{LabelingError, LabelingResult};

/// Source of the raw mapping document bytes
#[async_trait]
pub trait MappingSource: Send + Sync {
    /// Raw document bytes
    async fn fetch(&self) -> LabelingResult<Vec<u8>>;

    /// Human-readable location for logs and errors
    fn location(&self) -> &str;
}

#[derive(Debug, Clone)]
enum Location {
    Http(Url),
    File(PathBuf),
}

/// Fetches the mapping from an `http(s)://` URL, a `file://` URL or a filesystem path
#[derive(Debug)]
pub struct MappingFetcher {
    raw: String,
    location: Location,
    client: Client,
    cache: OnceCell<Vec<u8>>,
}

impl MappingFetcher {
    pub fn new(location: &str, timeout: Duration) -> LabelingResult<Self> {
        let parsed = match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Location::Http(url),
            Ok(url) if url.scheme() == "file" => {
                let path = url.to_file_path().map_err(|()| {
                    LabelingError::config_error(format!("Invalid file URL: {location}"))
                })?;
                Location::File(path)
            }
            Ok(url) if url.scheme().len() > 1 => {
                return Err(LabelingError::config_error(format!(
                    "Unsupported mapping URL scheme '{}'",
                    url.scheme()
                )))
            }
            // Plain paths, including Windows drive letters that parse as a scheme
            _ => Location::File(PathBuf::from(location)),
        };

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("ineo-labeling/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                LabelingError::config_error(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            raw: location.to_string(),
            location: parsed,
            client,
            cache: OnceCell::new(),
        })
    }

    async fn load(&self) -> LabelingResult<Vec<u8>> {
        match &self.location {
            Location::Http(url) => {
                info!(url = %url, "Fetching mapping document");
                let response = self
                    .client
                    .get(url.clone())
                    .send()
                    .await
                    .map_err(|e| LabelingError::mapping_fetch(&self.raw, e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(LabelingError::mapping_fetch(
                        &self.raw,
                        format!("HTTP {status}"),
                    ));
                }

                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| LabelingError::mapping_fetch(&self.raw, e.to_string()))?;
                Ok(bytes.to_vec())
            }
            Location::File(path) => {
                info!(path = %path.display(), "Reading mapping document");
                tokio::fs::read(path)
                    .await
                    .map_err(|e| LabelingError::mapping_fetch(&self.raw, e.to_string()))
            }
        }
    }
}

#[async_trait]
impl MappingSource for MappingFetcher {
    async fn fetch(&self) -> LabelingResult<Vec<u8>> {
        let bytes = self.cache.get_or_try_init(|| self.load()).await?;
        debug!(location = %self.raw, bytes = bytes.len(), "Mapping document available");
        Ok(bytes.clone())
    }

    fn location(&self) -> &str {
        &self.raw
    }
}
