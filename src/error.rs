//! # Labeling Error Types
//!
//! Fatal errors abort a run and surface at the process boundary; per-record errors
//! ([`RecordError`], [`UpdateFailure`](crate::pipeline::UpdateFailure)) are caught where
//! they happen and folded into the run summary.

use thiserror::Error;

/// Labeling operation result type
pub type LabelingResult<T> = Result<T, LabelingError>;

/// Errors raised while labeling records
#[derive(Debug, Error)]
pub enum LabelingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Mapping fetch error: {location} - {reason}")]
    MappingFetch { location: String, reason: String },

    #[error("Mapping parse error: {0}")]
    MappingParse(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    #[error("Update error for record {id}: {reason}")]
    Update { id: String, reason: String },
}

/// A single record that cannot be resolved to a decision
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("record {id} is missing required field '{field}'")]
    MissingField { id: String, field: &'static str },

    #[error("record {id} has non-numeric level {value}")]
    InvalidLevel { id: String, value: String },

    #[error("record {id} has field '{field}' of unexpected type: {value}")]
    InvalidField {
        id: String,
        field: &'static str,
        value: String,
    },
}

impl RecordError {
    /// Id of the offending record, or `<unknown>` when the id itself was missing
    pub fn record_id(&self) -> &str {
        match self {
            RecordError::MissingField { id, .. }
            | RecordError::InvalidLevel { id, .. }
            | RecordError::InvalidField { id, .. } => id,
        }
    }
}

impl LabelingError {
    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a mapping fetch error for the given document location
    pub fn mapping_fetch(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MappingFetch {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Create a mapping parse error
    pub fn mapping_parse(message: impl Into<String>) -> Self {
        Self::MappingParse(message.into())
    }

    /// Create a fetch error
    pub fn fetch_error(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    /// Create an update error for a single record
    pub fn update_error(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Update {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error aborts the whole run
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        match self {
            LabelingError::Config(_)
            | LabelingError::MappingFetch { .. }
            | LabelingError::MappingParse(_)
            | LabelingError::Fetch(_) => true,
            LabelingError::Record(_) | LabelingError::Update { .. } => false,
        }
    }
}

impl From<config::ConfigError> for LabelingError {
    fn from(error: config::ConfigError) -> Self {
        LabelingError::Config(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(LabelingError::config_error("missing SOLR_URL").is_fatal());
        assert!(LabelingError::mapping_fetch("http://x", "404").is_fatal());
        assert!(LabelingError::mapping_parse("bad level").is_fatal());
        assert!(LabelingError::fetch_error("page 2 failed").is_fatal());
        assert!(!LabelingError::update_error("rec-1", "HTTP 500").is_fatal());

        let record = RecordError::MissingField {
            id: "rec-2".to_string(),
            field: "dataProvider",
        };
        assert!(!LabelingError::from(record).is_fatal());
    }

    #[test]
    fn test_record_error_display() {
        let err = RecordError::InvalidLevel {
            id: "rec-3".to_string(),
            value: "\"top\"".to_string(),
        };
        assert_eq!(err.record_id(), "rec-3");
        assert_eq!(err.to_string(), "record rec-3 has non-numeric level \"top\"");

        let err = RecordError::InvalidField {
            id: "rec-4".to_string(),
            field: "dataProvider",
            value: "[\"A\",\"B\"]".to_string(),
        };
        assert_eq!(err.record_id(), "rec-4");
        assert_eq!(
            err.to_string(),
            "record rec-4 has field 'dataProvider' of unexpected type: [\"A\",\"B\"]"
        );
    }
}
