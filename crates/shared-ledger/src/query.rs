//! Query results, history entries, events and attribute selectors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A key and its current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValue {
    /// Ledger key.
    pub key: String,
    /// Raw stored bytes.
    pub value: Vec<u8>,
}

/// One page of a paginated query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Records in key order.
    pub records: Vec<KeyValue>,
    /// Bookmark of the next page; empty when exhausted.
    pub bookmark: String,
    /// Number of records returned.
    pub fetched: usize,
}

/// One committed version of a key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyModification {
    /// Transaction that wrote this version.
    pub tx_id: String,
    /// Commit timestamp of that transaction.
    pub timestamp: DateTime<Utc>,
    /// True when the version is a deletion.
    pub is_delete: bool,
    /// Value written; empty for deletions.
    pub value: Vec<u8>,
}

/// An event attached to a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChaincodeEvent {
    /// Event name, e.g. `ShipmentCreated`.
    pub name: String,
    /// JSON payload bytes.
    pub payload: Vec<u8>,
}

/// Equality selector over top-level JSON fields.
///
/// Equivalent to `SELECT WHERE field1 = v1 AND field2 = v2 ...`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selector {
    clauses: Vec<(String, Value)>,
}

impl Selector {
    /// Empty selector; matches every JSON object.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality clause.
    #[must_use]
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.clauses.push((field.into(), value.into()));
        self
    }

    /// Clauses in insertion order.
    #[must_use]
    pub fn clauses(&self) -> &[(String, Value)] {
        &self.clauses
    }

    /// True when `doc` is an object satisfying every clause.
    ///
    /// A missing boolean field compares equal to `false`.
    #[must_use]
    pub fn matches(&self, doc: &Value) -> bool {
        let Some(obj) = doc.as_object() else {
            return false;
        };
        self.clauses.iter().all(|(field, expected)| match obj.get(field) {
            Some(actual) => actual == expected,
            None => expected == &Value::Bool(false),
        })
    }

    /// True when `bytes` decode to JSON satisfying the selector.
    #[must_use]
    pub fn matches_bytes(&self, bytes: &[u8]) -> bool {
        serde_json::from_slice::<Value>(bytes).is_ok_and(|doc| self.matches(&doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_selector_matches_all_clauses() {
        let sel = Selector::new()
            .eq("objectType", "Shipment")
            .eq("status", "CREATED");
        assert!(sel.matches(&json!({"objectType": "Shipment", "status": "CREATED", "x": 1})));
        assert!(!sel.matches(&json!({"objectType": "Shipment", "status": "PROCESSED"})));
        assert!(!sel.matches(&json!("not an object")));
    }

    #[test]
    fn test_missing_bool_is_false() {
        let sel = Selector::new().eq("isArchived", false);
        assert!(sel.matches(&json!({"objectType": "Shipment"})));
        assert!(!sel.matches(&json!({"isArchived": true})));
    }

    #[test]
    fn test_matches_bytes_rejects_garbage() {
        assert!(!Selector::new().matches_bytes(b"\xff\xfe"));
        assert!(Selector::new().matches_bytes(br#"{"a":1}"#));
    }
}
