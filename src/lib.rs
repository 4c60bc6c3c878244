#![allow(clippy::doc_markdown)] // Allow technical terms like Solr, XML in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # INEO Labeling
//!
//! Labels every record in a Solr index with a boolean membership flag (`ineo_record` by
//! default), driven by an external provider-rule mapping document.
//!
//! ## Overview
//!
//! Each run:
//!
//! 1. fetches and parses the mapping document into a [`mapping::ProviderRegistry`]
//! 2. reads every matching record from the index in concurrent pages
//! 3. resolves each record independently with [`resolver::resolve`]
//! 4. writes each decision back as an independent atomic field update
//! 5. reports counts and every record-level failure in a [`pipeline::RunSummary`]
//!
//! ## Module Organization
//!
//! - [`mapping`] - Mapping document retrieval, parsing, and the rule registry
//! - [`resolver`] - Per-record decision logic
//! - [`index`] - Search index wire protocol and HTTP client
//! - [`pipeline`] - Record source, record sink, and the run orchestrator
//! - [`config`] - Configuration loading
//! - [`error`] - Structured error handling
//! - [`logging`] - Console logging setup
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ineo_labeling::{LabelingConfig, LabelingOrchestrator, MappingFetcher, SolrClient};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = LabelingConfig::load(None)?;
//! let index = Arc::new(SolrClient::new(&config.index)?);
//! let mapping = Arc::new(MappingFetcher::new(
//!     &config.mapping_url,
//!     config.index.request_timeout(),
//! )?);
//!
//! let summary = LabelingOrchestrator::new(config, index, mapping).run().await?;
//! println!("labeled {} records in scope", summary.labeled_true);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod mapping;
pub mod pipeline;
pub mod resolver;

pub use config::{IndexConfig, LabelingConfig};
pub use error::{LabelingError, LabelingResult, RecordError};
pub use index::{FieldUpdate, SearchIndex, SelectPage, SolrClient};
pub use mapping::{MappingFetcher, MappingSource, ProviderRegistry, ProviderRule};
pub use pipeline::{LabelingOrchestrator, RunSummary, UpdateFailure};
pub use resolver::{resolve, InputRecord, LabelDecision, MalformedField};
