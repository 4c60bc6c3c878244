//! # Resolver
//!
//! Decides, for one index record, whether it carries the membership flag.
//!
//! Precedence for a record whose provider has a rule:
//!
//! 1. rule profile equals the record's component profile ⇒ `true`
//! 2. rule level equals the record's hierarchy weight ⇒ `true`
//! 3. rule default, when present
//! 4. `false`
//!
//! A provider without any rule gets the registry's global default instead.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::error::RecordError;
use crate::mapping::ProviderRegistry;

/// Placeholder id used in errors for records that arrive without one
pub const UNKNOWN_RECORD_ID: &str = "<unknown>";

/// Read-only view of an index document, limited to the fields resolution needs
///
/// Decoding never fails on a wrongly typed field (a multi-valued `dataProvider` sent
/// as an array, say). The field is left empty and remembered in `malformed`, so the
/// record fails resolution on its own instead of taking its whole page down.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawInputRecord")]
pub struct InputRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "dataProvider")]
    pub data_provider: Option<String>,
    #[serde(default, rename = "_componentProfileId")]
    pub component_profile_id: Option<String>,
    /// Kept raw; the index may send it as a number or a string
    #[serde(default, rename = "_hierarchyWeight")]
    pub hierarchy_weight: Option<Value>,
    /// First text field that arrived with a non-string value
    #[serde(skip)]
    pub malformed: Option<MalformedField>,
}

/// A text field whose JSON value was not a string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedField {
    pub field: &'static str,
    pub value: String,
}

/// Document shape as the index sends it, before field types are checked
#[derive(Deserialize)]
struct RawInputRecord {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default, rename = "dataProvider")]
    data_provider: Option<Value>,
    #[serde(default, rename = "_componentProfileId")]
    component_profile_id: Option<Value>,
    #[serde(default, rename = "_hierarchyWeight")]
    hierarchy_weight: Option<Value>,
}

impl From<RawInputRecord> for InputRecord {
    fn from(raw: RawInputRecord) -> Self {
        let mut malformed = None;
        let mut text = |field: &'static str, value: Option<Value>| match value {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text),
            Some(other) => {
                if malformed.is_none() {
                    malformed = Some(MalformedField {
                        field,
                        value: other.to_string(),
                    });
                }
                None
            }
        };

        let id = text("id", raw.id);
        let data_provider = text("dataProvider", raw.data_provider);
        let component_profile_id = text("_componentProfileId", raw.component_profile_id);

        Self {
            id,
            data_provider,
            component_profile_id,
            hierarchy_weight: raw.hierarchy_weight,
            malformed,
        }
    }
}

impl InputRecord {
    pub fn new(id: impl Into<String>, data_provider: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            data_provider: Some(data_provider.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.component_profile_id = Some(profile.into());
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<Value>) -> Self {
        self.hierarchy_weight = Some(level.into());
        self
    }

    pub fn id_or_unknown(&self) -> &str {
        self.id.as_deref().unwrap_or(UNKNOWN_RECORD_ID)
    }

    /// Fails when a field arrived with a type resolution cannot use
    pub fn check_fields(&self) -> Result<(), RecordError> {
        match &self.malformed {
            None => Ok(()),
            Some(MalformedField { field, value }) => Err(RecordError::InvalidField {
                id: self.id_or_unknown().to_string(),
                field: *field,
                value: value.clone(),
            }),
        }
    }

    /// Hierarchy weight normalized to an integer
    ///
    /// Accepts JSON integers, integral floats and trimmed numeric strings; `Ok(None)`
    /// when the record has no weight (or an explicit `null`).
    pub fn level(&self) -> Result<Option<i64>, RecordError> {
        let invalid = |value: &Value| RecordError::InvalidLevel {
            id: self.id_or_unknown().to_string(),
            value: value.to_string(),
        };

        match &self.hierarchy_weight {
            None | Some(Value::Null) => Ok(None),
            Some(value @ Value::Number(number)) => {
                if let Some(level) = number.as_i64() {
                    Ok(Some(level))
                } else {
                    number
                        .as_f64()
                        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                        .map(|f| Some(f as i64))
                        .ok_or_else(|| invalid(value))
                }
            }
            Some(value @ Value::String(text)) => text
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| invalid(value)),
            Some(value) => Err(invalid(value)),
        }
    }
}

/// The computed flag for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDecision {
    pub id: String,
    pub decision: bool,
}

/// Resolve one record against the registry
pub fn resolve(record: &InputRecord, registry: &ProviderRegistry) -> Result<bool, RecordError> {
    record.check_fields()?;

    let Some(provider) = record.data_provider.as_deref() else {
        return Err(RecordError::MissingField {
            id: record.id_or_unknown().to_string(),
            field: "dataProvider",
        });
    };

    let Some(rule) = registry.get(provider) else {
        trace!(
            record_id = record.id_or_unknown(),
            provider = provider,
            decision = registry.global_default(),
            "No rule for provider, using global default"
        );
        return Ok(registry.global_default());
    };

    if let (Some(expected), Some(actual)) = (rule.profile(), record.component_profile_id.as_deref())
    {
        if expected == actual {
            trace!(record_id = record.id_or_unknown(), provider = provider, "Profile match");
            return Ok(true);
        }
    }

    if let Some(expected) = rule.level() {
        if record.level()? == Some(expected) {
            trace!(record_id = record.id_or_unknown(), provider = provider, "Level match");
            return Ok(true);
        }
    }

    Ok(rule.default().unwrap_or(false))
}

/// Resolve a record into a [`LabelDecision`], which also requires an id
pub fn decide(record: &InputRecord, registry: &ProviderRegistry) -> Result<LabelDecision, RecordError> {
    record.check_fields()?;

    let Some(id) = record.id.as_deref() else {
        return Err(RecordError::MissingField {
            id: UNKNOWN_RECORD_ID.to_string(),
            field: "id",
        });
    };

    Ok(LabelDecision {
        id: id.to_string(),
        decision: resolve(record, registry)?,
    })
}
