//! # Mapping Parser
//!
//! Turns the provider-rule XML document into a [`ProviderRegistry`].
//!
//! ```xml
//! <datasets default="false">
//!     <provider name="Meertens Institute - Research Collections">
//!         <profile>clarin.eu:cr1:p_1440426460262</profile>
//!     </provider>
//!     <provider name="The Language Archive">
//!         <level>0</level>
//!     </provider>
//!     <root name="CLARIN Partners">
//!         <default>true</default>
//!     </root>
//! </datasets>
//! ```
//!
//! `provider` and `root` entries are the same kind of rule. All `provider` entries are
//! registered before all `root` entries, each group in document order.

use roxmltree::{Document, Node};
use tracing::debug;

use super::registry::{ProviderRegistry, ProviderRule};
use crate::error::{LabelingError, LabelingResult};

const PROVIDER_TAG: &str = "provider";
const ROOT_TAG: &str = "root";

/// Parse raw mapping bytes
pub fn parse_mapping(bytes: &[u8]) -> LabelingResult<ProviderRegistry> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| LabelingError::mapping_parse(format!("document is not UTF-8: {e}")))?;
    parse_mapping_str(text)
}

/// Parse a mapping document held in a string
pub fn parse_mapping_str(text: &str) -> LabelingResult<ProviderRegistry> {
    let document = Document::parse(text)
        .map_err(|e| LabelingError::mapping_parse(format!("malformed XML: {e}")))?;
    let root = document.root_element();

    let global_default = root.attribute("default") == Some("true");

    let mut rules = Vec::new();
    for tag in [PROVIDER_TAG, ROOT_TAG] {
        for node in root
            .children()
            .filter(|n| n.is_element() && n.has_tag_name(tag))
        {
            rules.push(parse_rule(node)?);
        }
    }

    debug!(
        global_default = global_default,
        rule_count = rules.len(),
        "Parsed provider mapping"
    );

    Ok(ProviderRegistry::new(global_default, rules))
}

fn parse_rule(node: Node<'_, '_>) -> LabelingResult<ProviderRule> {
    let tag = node.tag_name().name();
    let position = node.document().text_pos_at(node.range().start);

    let name = match node.attribute("name") {
        Some(name) if !name.is_empty() => name,
        _ => {
            return Err(LabelingError::mapping_parse(format!(
                "<{tag}> at {position} has no name attribute"
            )))
        }
    };

    let profile = child_text(node, "profile")
        .flatten()
        .map(ToString::to_string);

    let level = match child_text(node, "level") {
        None => None,
        Some(text) => {
            let raw = text.unwrap_or_default().trim();
            let level = raw.parse::<i64>().map_err(|_| {
                LabelingError::mapping_parse(format!(
                    "provider '{name}' has non-integer level '{raw}'"
                ))
            })?;
            Some(level)
        }
    };

    // Exact text, no trimming, matching the root attribute
    let default = child_text(node, "default").map(|text| text == Some("true"));

    Ok(ProviderRule::new(name, profile, level, default))
}

/// Text of the first child element named `name`: outer `None` when the element is
/// absent, inner `None` when it is present but empty.
fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<Option<&'a str>> {
    node.children()
        .find(|child| child.is_element() && child.has_tag_name(name))
        .map(|child| child.text())
}
