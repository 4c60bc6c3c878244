//! Provider rules and the registry built from a mapping document.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// One provider's matching criteria
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRule {
    name: String,
    profile: Option<String>,
    level: Option<i64>,
    default: Option<bool>,
}

impl ProviderRule {
    pub fn new(
        name: impl Into<String>,
        profile: Option<String>,
        level: Option<i64>,
        default: Option<bool>,
    ) -> Self {
        Self {
            name: name.into(),
            profile,
            level,
            default,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Exact-match component profile id, if the rule carries one
    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Exact-match hierarchy level, if the rule carries one
    pub fn level(&self) -> Option<i64> {
        self.level
    }

    /// Provider-specific fallback decision
    pub fn default(&self) -> Option<bool> {
        self.default
    }
}

/// Parsed mapping document: ordered rules plus the document-wide default
///
/// Lookups are first-wins: when several rules share a name only the one that appeared
/// first in the document is ever consulted. The registry is immutable after
/// construction and is shared across workers behind an `Arc`.
///
/// # Examples
///
/// ```rust
/// use ineo_labeling::mapping::{ProviderRegistry, ProviderRule};
///
/// let registry = ProviderRegistry::new(
///     false,
///     vec![
///         ProviderRule::new("DANS", None, None, Some(true)),
///         ProviderRule::new("DANS", None, None, Some(false)),
///     ],
/// );
///
/// assert_eq!(registry.get("DANS").and_then(|r| r.default()), Some(true));
/// assert!(registry.get("Unknown").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    global_default: bool,
    rules: Vec<ProviderRule>,
    by_name: HashMap<String, usize>,
}

impl ProviderRegistry {
    pub fn new(global_default: bool, rules: Vec<ProviderRule>) -> Self {
        let mut by_name = HashMap::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            if let Some(first) = by_name.get(rule.name()) {
                warn!(
                    provider = %rule.name(),
                    first_position = first,
                    ignored_position = index,
                    "Duplicate provider rule in mapping, keeping the first definition"
                );
                continue;
            }
            by_name.insert(rule.name().to_string(), index);
        }

        Self {
            global_default,
            rules,
            by_name,
        }
    }

    /// First rule registered under `name`
    pub fn get(&self, name: &str) -> Option<&ProviderRule> {
        self.by_name.get(name).map(|&index| &self.rules[index])
    }

    /// Decision for records whose provider has no rule
    pub fn global_default(&self) -> bool {
        self.global_default
    }

    /// All rules in document order, duplicates included
    pub fn rules(&self) -> &[ProviderRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
