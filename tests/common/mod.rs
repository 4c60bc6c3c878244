//! Shared test fixtures: an in-memory index and an in-memory mapping source.

#![allow(dead_code)]

use async_trait::async_trait;
use ineo_labeling::config::{
    IndexConfig, LabelingConfig, DEFAULT_COMMIT_WITHIN_MS, DEFAULT_FLAG_FIELD, DEFAULT_QUERY,
};
use ineo_labeling::{
    FieldUpdate, InputRecord, LabelingError, LabelingResult, MappingSource, SearchIndex,
    SelectPage,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory stand-in for a Solr core
#[derive(Default)]
pub struct MockIndex {
    docs: Vec<InputRecord>,
    /// `(start, rows)` of every select call, in call order
    pub selects: Mutex<Vec<(u64, u64)>>,
    /// Flag values written so far, by record id
    pub flags: Mutex<HashMap<String, bool>>,
    /// Every successfully applied update
    pub applied: Mutex<Vec<FieldUpdate>>,
    pub update_calls: AtomicUsize,
    failing_pages: HashSet<u64>,
    failing_updates: HashSet<String>,
}

impl MockIndex {
    pub fn with_docs(docs: Vec<InputRecord>) -> Self {
        Self {
            docs,
            ..Self::default()
        }
    }

    /// Make the page starting at `start` fail
    #[must_use]
    pub fn failing_page(mut self, start: u64) -> Self {
        self.failing_pages.insert(start);
        self
    }

    /// Make updates of record `id` fail
    #[must_use]
    pub fn failing_update(mut self, id: &str) -> Self {
        self.failing_updates.insert(id.to_string());
        self
    }

    pub fn page_requests(&self) -> Vec<(u64, u64)> {
        let mut pages: Vec<(u64, u64)> = self
            .selects
            .lock()
            .iter()
            .copied()
            .filter(|&(_, rows)| rows > 0)
            .collect();
        pages.sort_unstable();
        pages
    }

    pub fn flag(&self, id: &str) -> Option<bool> {
        self.flags.lock().get(id).copied()
    }
}

#[async_trait]
impl SearchIndex for MockIndex {
    async fn select(&self, _query: &str, start: u64, rows: u64) -> LabelingResult<SelectPage> {
        self.selects.lock().push((start, rows));
        if rows > 0 && self.failing_pages.contains(&start) {
            return Err(LabelingError::fetch_error(format!(
                "select start={start} rows={rows} failed: HTTP 500"
            )));
        }

        let begin = (start as usize).min(self.docs.len());
        let end = (start.saturating_add(rows) as usize).min(self.docs.len());
        Ok(SelectPage {
            num_found: self.docs.len() as u64,
            docs: self.docs[begin..end].to_vec(),
        })
    }

    async fn set_field(&self, update: &FieldUpdate) -> LabelingResult<()> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_updates.contains(&update.id) {
            return Err(LabelingError::update_error(&update.id, "HTTP 500: write failed"));
        }
        self.flags.lock().insert(update.id.clone(), update.value);
        self.applied.lock().push(update.clone());
        Ok(())
    }
}

/// Mapping document held in memory, counting how often it is fetched
pub struct StaticMapping {
    xml: String,
    pub fetches: AtomicUsize,
}

impl StaticMapping {
    pub fn new(xml: &str) -> Self {
        Self {
            xml: xml.to_string(),
            fetches: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl MappingSource for StaticMapping {
    async fn fetch(&self) -> LabelingResult<Vec<u8>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self.xml.as_bytes().to_vec())
    }

    fn location(&self) -> &str {
        "memory://mapping.xml"
    }
}

/// Mapping source whose retrieval always fails
pub struct UnreachableMapping;

#[async_trait]
impl MappingSource for UnreachableMapping {
    async fn fetch(&self) -> LabelingResult<Vec<u8>> {
        Err(LabelingError::mapping_fetch(self.location(), "HTTP 404"))
    }

    fn location(&self) -> &str {
        "https://mapping.invalid/mapping.xml"
    }
}

pub fn test_config(page_size: u64, workers: usize) -> LabelingConfig {
    LabelingConfig {
        mapping_url: "memory://mapping.xml".to_string(),
        index: IndexConfig {
            base_url: "http://localhost:8983/solr/records".to_string(),
            username: "labeler".to_string(),
            password: "secret".to_string(),
            query: DEFAULT_QUERY.to_string(),
            flag_field: DEFAULT_FLAG_FIELD.to_string(),
            page_size,
            commit_within_ms: DEFAULT_COMMIT_WITHIN_MS,
            request_timeout_ms: 1_000,
            max_retries: 0,
            retry_backoff_ms: 0,
        },
        workers,
        dry_run: false,
    }
}

/// `count` records of provider `provider` with ids `{prefix}-{n}`
pub fn records(prefix: &str, provider: &str, count: usize) -> Vec<InputRecord> {
    (0..count)
        .map(|n| InputRecord::new(format!("{prefix}-{n}"), provider))
        .collect()
}
