//! Wire types for the index select and update endpoints.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::resolver::InputRecord;

/// Body of `GET /select?wt=json`
#[derive(Debug, Clone, Deserialize)]
pub struct SelectResponse {
    pub response: SelectPage,
}

/// One page of matching documents plus the total match count
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectPage {
    #[serde(rename = "numFound")]
    pub num_found: u64,
    #[serde(default)]
    pub docs: Vec<InputRecord>,
}

/// Atomic "set" update of one boolean field on one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUpdate {
    pub id: String,
    pub field: String,
    pub value: bool,
    pub commit_within_ms: u64,
}

impl FieldUpdate {
    /// JSON body for `POST /update`
    pub fn to_payload(&self) -> Value {
        let mut doc = serde_json::Map::new();
        doc.insert("id".to_string(), Value::String(self.id.clone()));
        doc.insert(self.field.clone(), json!({ "set": self.value }));

        json!({
            "add": {
                "doc": doc,
                "commitWithin": self.commit_within_ms,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_payload_shape() {
        let update = FieldUpdate {
            id: "doc-1".to_string(),
            field: "ineo_record".to_string(),
            value: true,
            commit_within_ms: 1000,
        };

        assert_eq!(
            update.to_payload(),
            json!({
                "add": {
                    "doc": { "id": "doc-1", "ineo_record": { "set": true } },
                    "commitWithin": 1000
                }
            })
        );
    }

    #[test]
    fn test_select_response_parsing() {
        let body = json!({
            "responseHeader": { "status": 0 },
            "response": {
                "numFound": 2,
                "start": 0,
                "docs": [
                    { "id": "a", "dataProvider": "DANS", "_hierarchyWeight": 0 },
                    { "id": "b" }
                ]
            }
        });

        let parsed: SelectResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.response.num_found, 2);
        assert_eq!(parsed.response.docs.len(), 2);
        assert_eq!(parsed.response.docs[1].data_provider, None);

        let zero_rows: SelectResponse =
            serde_json::from_value(json!({ "response": { "numFound": 7 } })).unwrap();
        assert!(zero_rows.response.docs.is_empty());
    }

    #[test]
    fn test_wrongly_typed_doc_does_not_fail_page() {
        let body = json!({
            "response": {
                "numFound": 3,
                "docs": [
                    { "id": "a", "dataProvider": "DANS" },
                    { "id": "b", "dataProvider": ["DANS", "CLARIN Partners"] },
                    { "id": "c", "dataProvider": "CLARIN Partners", "_componentProfileId": 7 }
                ]
            }
        });

        let parsed: SelectResponse = serde_json::from_value(body).unwrap();
        let docs = &parsed.response.docs;
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].malformed, None);
        assert_eq!(docs[1].id.as_deref(), Some("b"));
        assert_eq!(docs[1].malformed.as_ref().map(|m| m.field), Some("dataProvider"));
        assert_eq!(
            docs[2].malformed.as_ref().map(|m| m.field),
            Some("_componentProfileId")
        );
    }
}
