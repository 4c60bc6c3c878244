//! # Record Sink
//!
//! Writes decisions back to the index, one independent update per record. At most
//! `workers` updates are in flight; each runs as its own task and is joined, and its
//! outcome is folded into an [`UpdateReport`]. A failing or panicking update never
//! cancels its siblings.

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

use crate::index::{FieldUpdate, SearchIndex};
use crate::resolver::LabelDecision;

/// One update that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateFailure {
    pub id: String,
    pub cause: String,
}

/// Aggregate outcome of a batch of updates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReport {
    pub succeeded: usize,
    pub failures: Vec<UpdateFailure>,
}

impl UpdateReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn attempted(&self) -> usize {
        self.succeeded + self.failures.len()
    }
}

/// Concurrent writer of [`LabelDecision`]s
pub struct RecordSink {
    index: Arc<dyn SearchIndex>,
    flag_field: String,
    commit_within_ms: u64,
    workers: usize,
}

impl RecordSink {
    pub fn new(
        index: Arc<dyn SearchIndex>,
        flag_field: impl Into<String>,
        commit_within_ms: u64,
        workers: usize,
    ) -> Self {
        Self {
            index,
            flag_field: flag_field.into(),
            commit_within_ms,
            workers: workers.max(1),
        }
    }

    fn field_update(&self, decision: &LabelDecision) -> FieldUpdate {
        FieldUpdate {
            id: decision.id.clone(),
            field: self.flag_field.clone(),
            value: decision.decision,
            commit_within_ms: self.commit_within_ms,
        }
    }

    /// Apply every decision and report the outcome of each
    #[instrument(skip(self, decisions), fields(decisions = decisions.len(), workers = self.workers))]
    pub async fn apply(&self, decisions: Vec<LabelDecision>) -> UpdateReport {
        let report = stream::iter(decisions)
            .map(|decision| {
                let update = self.field_update(&decision);
                let index = Arc::clone(&self.index);
                async move {
                    let handle = tokio::spawn(async move {
                        index.set_field(&update).await.map_err(|e| e.to_string())
                    });
                    (decision.id, handle.await)
                }
            })
            .buffer_unordered(self.workers)
            .fold(UpdateReport::default(), |mut report, (id, joined)| async move {
                match joined {
                    Ok(Ok(())) => report.succeeded += 1,
                    Ok(Err(cause)) => {
                        warn!(record_id = %id, cause = %cause, "Record update failed");
                        report.failures.push(UpdateFailure { id, cause });
                    }
                    Err(e) => {
                        error!(record_id = %id, error = %e, "Record update task panicked");
                        report.failures.push(UpdateFailure {
                            id,
                            cause: format!("update task panicked: {e}"),
                        });
                    }
                }
                report
            })
            .await;

        info!(
            succeeded = report.succeeded,
            failed = report.failed(),
            "Finished applying record updates"
        );
        report
    }
}
