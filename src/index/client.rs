//! # Solr Client
//!
//! HTTP implementation of [`SearchIndex`] for a Solr core.
//!
//! - `GET {base_url}/select?q=…&wt=json&start=…&rows=…`
//! - `POST {base_url}/update` with an atomic `set` document
//!
//! Both use HTTP basic authentication and the configured per-request timeout.

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, info};

use super::retry::{AttemptError, RetryPolicy};
use super::types::{FieldUpdate, SelectPage, SelectResponse};
use super::SearchIndex;
use crate::config::IndexConfig;
use crate::error::{LabelingError, LabelingResult};

/// HTTP client for one Solr core
#[derive(Clone)]
pub struct SolrClient {
    client: Client,
    select_url: Url,
    update_url: Url,
    username: String,
    password: String,
    retry: RetryPolicy,
}

impl std::fmt::Debug for SolrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolrClient")
            .field("select_url", &self.select_url.as_str())
            .field("update_url", &self.update_url.as_str())
            .field("username", &self.username)
            .field("retry", &self.retry)
            .finish()
    }
}

impl SolrClient {
    /// Create a client for the core at `config.base_url`
    pub fn new(config: &IndexConfig) -> LabelingResult<Self> {
        let base = config.base_url.trim_end_matches('/');
        let endpoint = |path: &str| {
            Url::parse(&format!("{base}/{path}")).map_err(|e| {
                LabelingError::config_error(format!("Invalid index base URL '{base}': {e}"))
            })
        };
        let select_url = endpoint("select")?;
        let update_url = endpoint("update")?;

        let client = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(format!("ineo-labeling/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                LabelingError::config_error(format!("Failed to create HTTP client: {e}"))
            })?;

        info!(
            base_url = %base,
            timeout_ms = config.request_timeout_ms,
            max_retries = config.max_retries,
            "Created index client"
        );

        Ok(Self {
            client,
            select_url,
            update_url,
            username: config.username.clone(),
            password: config.password.clone(),
            retry: config.retry_policy(),
        })
    }

    async fn select_once(
        &self,
        query: &str,
        start: u64,
        rows: u64,
    ) -> Result<SelectPage, AttemptError> {
        let response = self
            .client
            .get(self.select_url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .query(&[
                ("q", query.to_string()),
                ("wt", "json".to_string()),
                ("start", start.to_string()),
                ("rows", rows.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AttemptError::from_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AttemptError::from_status(status, &body));
        }

        let parsed = response.json::<SelectResponse>().await.map_err(|e| {
            if e.is_decode() {
                AttemptError::Permanent(format!("Invalid select response: {e}"))
            } else {
                AttemptError::from_transport(&e)
            }
        })?;

        Ok(parsed.response)
    }

    async fn update_once(&self, update: &FieldUpdate) -> Result<(), AttemptError> {
        let response = self
            .client
            .post(self.update_url.clone())
            .basic_auth(&self.username, Some(&self.password))
            .json(&update.to_payload())
            .send()
            .await
            .map_err(|e| AttemptError::from_transport(&e))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(AttemptError::from_status(status, &body))
        }
    }
}

#[async_trait]
impl SearchIndex for SolrClient {
    async fn select(&self, query: &str, start: u64, rows: u64) -> LabelingResult<SelectPage> {
        debug!(query = query, start = start, rows = rows, "Selecting records");

        self.retry
            .run("select", || self.select_once(query, start, rows))
            .await
            .map_err(|e| {
                LabelingError::fetch_error(format!(
                    "select start={start} rows={rows} failed: {}",
                    e.message()
                ))
            })
    }

    async fn set_field(&self, update: &FieldUpdate) -> LabelingResult<()> {
        self.retry
            .run("update", || self.update_once(update))
            .await
            .map_err(|e| LabelingError::update_error(&update.id, e.message()))?;

        debug!(record_id = %update.id, field = %update.field, value = update.value, "Record updated");
        Ok(())
    }
}
