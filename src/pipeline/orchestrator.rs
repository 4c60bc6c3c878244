//! # Labeling Orchestrator
//!
//! Runs one labeling pass:
//!
//! ```text
//! mapping source ─► parse ─► ProviderRegistry
//!                                  │
//! index ─► RecordSource ─► records ─► resolve ─► decisions ─► RecordSink ─► index
//! ```
//!
//! Mapping and fetch failures abort the run. Record-level resolution failures and
//! update failures are collected into the [`RunSummary`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::sink::{RecordSink, UpdateFailure, UpdateReport};
use super::source::RecordSource;
use crate::config::LabelingConfig;
use crate::error::{LabelingResult, RecordError};
use crate::index::SearchIndex;
use crate::mapping::{parse_mapping, MappingSource, ProviderRegistry};
use crate::resolver::{decide, InputRecord, LabelDecision};

/// A record that could not be resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFailure {
    pub id: String,
    pub cause: String,
}

impl From<&RecordError> for RecordFailure {
    fn from(error: &RecordError) -> Self {
        Self {
            id: error.record_id().to_string(),
            cause: error.to_string(),
        }
    }
}

/// Final report of a labeling run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub dry_run: bool,
    pub records_seen: usize,
    pub labeled_true: usize,
    pub labeled_false: usize,
    pub resolution_failures: Vec<RecordFailure>,
    pub updates_succeeded: usize,
    pub update_failures: Vec<UpdateFailure>,
}

impl RunSummary {
    /// Whether any record failed to resolve or to update
    pub fn has_record_failures(&self) -> bool {
        !self.resolution_failures.is_empty() || !self.update_failures.is_empty()
    }
}

/// Result of resolving a whole record set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub decisions: Vec<LabelDecision>,
    pub failures: Vec<RecordFailure>,
}

impl Resolution {
    pub fn labeled_true(&self) -> usize {
        self.decisions.iter().filter(|d| d.decision).count()
    }

    pub fn labeled_false(&self) -> usize {
        self.decisions.len() - self.labeled_true()
    }
}

/// Resolve every record, keeping failures instead of stopping at the first one
pub fn resolve_all(records: &[InputRecord], registry: &ProviderRegistry) -> Resolution {
    let mut resolution = Resolution::default();
    for record in records {
        match decide(record, registry) {
            Ok(decision) => resolution.decisions.push(decision),
            Err(error) => {
                warn!(record_id = error.record_id(), error = %error, "Record could not be resolved");
                resolution.failures.push(RecordFailure::from(&error));
            }
        }
    }
    resolution
}

/// Wires mapping, index reads, resolution, and index writes for one run
pub struct LabelingOrchestrator {
    config: LabelingConfig,
    index: Arc<dyn SearchIndex>,
    mapping: Arc<dyn MappingSource>,
}

impl LabelingOrchestrator {
    pub fn new(
        config: LabelingConfig,
        index: Arc<dyn SearchIndex>,
        mapping: Arc<dyn MappingSource>,
    ) -> Self {
        Self {
            config,
            index,
            mapping,
        }
    }

    pub fn config(&self) -> &LabelingConfig {
        &self.config
    }

    /// Fetch and parse the mapping document
    pub async fn load_registry(&self) -> LabelingResult<Arc<ProviderRegistry>> {
        let bytes = self.mapping.fetch().await?;
        let registry = parse_mapping(&bytes)?;
        info!(
            location = %self.mapping.location(),
            rules = registry.len(),
            global_default = registry.global_default(),
            "Loaded provider mapping"
        );
        Ok(Arc::new(registry))
    }

    /// Run one full labeling pass
    #[instrument(skip(self, run_id), fields(run_id = %run_id, dry_run = self.config.dry_run))]
    pub async fn run_with_id(&self, run_id: Uuid) -> LabelingResult<RunSummary> {
        let started_at = Utc::now();
        info!("Starting labeling run");

        let registry = self.load_registry().await?;

        let source = RecordSource::new(
            Arc::clone(&self.index),
            self.config.index.page_size,
            self.config.workers,
        );
        let records = source.fetch_all(&self.config.index.query).await?;

        let resolution = resolve_all(&records, &registry);
        let labeled_true = resolution.labeled_true();
        let labeled_false = resolution.labeled_false();
        info!(
            records = records.len(),
            labeled_true = labeled_true,
            labeled_false = labeled_false,
            unresolved = resolution.failures.len(),
            "Resolved records"
        );

        let report = if self.config.dry_run {
            info!(
                decisions = resolution.decisions.len(),
                "Dry run, skipping index updates"
            );
            UpdateReport::default()
        } else {
            let sink = RecordSink::new(
                Arc::clone(&self.index),
                self.config.index.flag_field.clone(),
                self.config.index.commit_within_ms,
                self.config.workers,
            );
            sink.apply(resolution.decisions).await
        };

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            dry_run: self.config.dry_run,
            records_seen: records.len(),
            labeled_true,
            labeled_false,
            resolution_failures: resolution.failures,
            updates_succeeded: report.succeeded,
            update_failures: report.failures,
        };

        info!(
            records_seen = summary.records_seen,
            labeled_true = summary.labeled_true,
            labeled_false = summary.labeled_false,
            resolution_failures = summary.resolution_failures.len(),
            updates_succeeded = summary.updates_succeeded,
            update_failures = summary.update_failures.len(),
            "Labeling run completed"
        );

        Ok(summary)
    }

    /// Run one full labeling pass under a fresh run id
    pub async fn run(&self) -> LabelingResult<RunSummary> {
        self.run_with_id(Uuid::new_v4()).await
    }
}
