//! # Record Source
//!
//! Reads every record matching a query: one zero-row request for the total count,
//! then concurrent page requests covering `[0, numFound)`.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{LabelingError, LabelingResult};
use crate::index::SearchIndex;
use crate::resolver::InputRecord;

/// Paginated reader over a [`SearchIndex`]
pub struct RecordSource {
    index: Arc<dyn SearchIndex>,
    page_size: u64,
    workers: usize,
}

impl RecordSource {
    pub fn new(index: Arc<dyn SearchIndex>, page_size: u64, workers: usize) -> Self {
        Self {
            index,
            page_size,
            workers: workers.max(1),
        }
    }

    /// Offsets of every page needed to cover `total` records
    pub fn page_offsets(total: u64, page_size: u64) -> Vec<u64> {
        if page_size == 0 {
            return Vec::new();
        }
        (0..total.div_ceil(page_size))
            .map(|page| page * page_size)
            .collect()
    }

    /// Fetch all matching records, unordered
    ///
    /// Any failing page fails the whole fetch; pages still in flight are dropped.
    #[instrument(skip(self), fields(page_size = self.page_size, workers = self.workers))]
    pub async fn fetch_all(&self, query: &str) -> LabelingResult<Vec<InputRecord>> {
        if self.page_size == 0 {
            return Err(LabelingError::config_error("page size must be positive"));
        }

        let total = self.index.select(query, 0, 0).await?.num_found;
        let offsets = Self::page_offsets(total, self.page_size);
        info!(
            total_records = total,
            pages = offsets.len(),
            "Fetching records from index"
        );

        let page_size = self.page_size;
        let pages: Vec<Vec<InputRecord>> = stream::iter(offsets)
            .map(|start| async move {
                let page = self.index.select(query, start, page_size).await?;
                debug!(start = start, docs = page.docs.len(), "Fetched page");
                Ok::<_, LabelingError>(page.docs)
            })
            .buffer_unordered(self.workers)
            .try_collect()
            .await?;

        let records: Vec<InputRecord> = pages.into_iter().flatten().collect();
        if records.len() as u64 != total {
            warn!(
                expected = total,
                fetched = records.len(),
                "Fetched record count differs from numFound, index changed during fetch"
            );
        }

        info!(fetched = records.len(), "Finished fetching records");
        Ok(records)
    }
}
