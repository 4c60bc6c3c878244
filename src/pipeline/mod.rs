//! # Labeling Pipeline
//!
//! Paginated reads, per-record resolution, and concurrent writes.

pub mod orchestrator;
pub mod sink;
pub mod source;

pub use orchestrator::{resolve_all, LabelingOrchestrator, RecordFailure, Resolution, RunSummary};
pub use sink::{RecordSink, UpdateFailure, UpdateReport};
pub use source::RecordSource;
