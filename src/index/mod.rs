//! # Search Index Access
//!
//! The pipeline only talks to the index through [`SearchIndex`]; [`SolrClient`] is the
//! HTTP implementation used in production.

pub mod client;
pub mod retry;
pub mod types;

use async_trait::async_trait;

use crate::error::LabelingResult;

pub use client::SolrClient;
pub use retry::{AttemptError, RetryPolicy};
pub use types::{FieldUpdate, SelectPage, SelectResponse};

/// Read and write operations the labeling pipeline needs from the index
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Read `rows` documents matching `query`, starting at offset `start`
    ///
    /// A failure is reported as [`LabelingError::Fetch`](crate::LabelingError::Fetch).
    async fn select(&self, query: &str, start: u64, rows: u64) -> LabelingResult<SelectPage>;

    /// Apply one field update
    ///
    /// A failure is reported as [`LabelingError::Update`](crate::LabelingError::Update).
    async fn set_field(&self, update: &FieldUpdate) -> LabelingResult<()>;
}
