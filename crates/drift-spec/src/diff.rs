//! Diff entries
//!
//! A drift result is a list of additions, deletions and modifications. Each
//! entry names the configuration key it refers to and the category (product
//! component) the key belongs to.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A key whose value was added to, or removed from, the live configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueChange {
    /// Configuration key (usually a dotted path)
    pub key: String,

    /// Component the key belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// The added (desired) or removed (current) value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// A key present on both sides with differing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Modification {
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Live value; an empty string when the source had none
    pub current_value: Value,

    /// Desired value; an empty string when the source had none
    pub desired_value: Value,
}

impl Modification {
    /// Create a modification, normalizing missing or empty values to `""`
    pub fn new(
        key: impl Into<String>,
        category: Option<String>,
        current_value: Option<Value>,
        desired_value: Option<Value>,
    ) -> Self {
        Self {
            key: key.into(),
            category,
            current_value: normalize_value(current_value),
            desired_value: normalize_value(desired_value),
        }
    }
}

fn normalize_value(value: Option<Value>) -> Value {
    match value {
        None | Some(Value::Null) => Value::String(String::new()),
        Some(Value::Array(items)) if items.is_empty() => Value::String(String::new()),
        Some(Value::Object(map)) if map.is_empty() => Value::String(String::new()),
        Some(other) => other,
    }
}

/// One difference between current and desired configuration
#[derive(Debug, Clone, PartialEq)]
pub enum DiffEntry {
    Addition(ValueChange),
    Deletion(ValueChange),
    Modification(Modification),
}

impl DiffEntry {
    /// Key the entry refers to, whatever its variant
    pub fn key(&self) -> &str {
        match self {
            DiffEntry::Addition(change) | DiffEntry::Deletion(change) => &change.key,
            DiffEntry::Modification(modification) => &modification.key,
        }
    }
}

/// Drift result partitioned by change kind
///
/// Empty partitions are omitted when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriftResult {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additions: Vec<ValueChange>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deletions: Vec<ValueChange>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifications: Vec<Modification>,
}

impl DriftResult {
    /// Partition diff entries by variant, keeping their relative order
    pub fn from_entries(entries: impl IntoIterator<Item = DiffEntry>) -> Self {
        let mut result = Self::default();
        for entry in entries {
            match entry {
                DiffEntry::Addition(change) => result.additions.push(change),
                DiffEntry::Deletion(change) => result.deletions.push(change),
                DiffEntry::Modification(modification) => result.modifications.push(modification),
            }
        }
        result
    }

    /// Total number of entries across all partitions
    pub fn len(&self) -> usize {
        self.additions.len() + self.deletions.len() + self.modifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_modification_normalizes_missing_values() {
        let modification = Modification::new("a.b", None, None, Some(Value::Null));
        assert_eq!(modification.current_value, json!(""));
        assert_eq!(modification.desired_value, json!(""));
    }

    #[test]
    fn test_modification_keeps_present_values() {
        let modification = Modification::new("ntp", Some("appliance".to_string()), Some(json!(["a"])), Some(json!(3)));
        assert_eq!(modification.current_value, json!(["a"]));
        assert_eq!(modification.desired_value, json!(3));
    }

    #[test]
    fn test_from_entries_partitions_by_variant() {
        let entries = vec![
            DiffEntry::Addition(ValueChange { key: "a".to_string(), category: None, value: Some(json!(1)) }),
            DiffEntry::Modification(Modification::new("m", None, Some(json!(1)), Some(json!(2)))),
            DiffEntry::Deletion(ValueChange { key: "d".to_string(), category: None, value: None }),
            DiffEntry::Addition(ValueChange { key: "b".to_string(), category: None, value: None }),
        ];

        let result = DriftResult::from_entries(entries);

        assert_eq!(result.additions.len(), 2);
        assert_eq!(result.additions[1].key, "b");
        assert_eq!(result.deletions.len(), 1);
        assert_eq!(result.modifications.len(), 1);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_serialization_omits_empty_partitions_and_fields() {
        let result = DriftResult::from_entries(vec![DiffEntry::Addition(ValueChange {
            key: "appliance.ntp".to_string(),
            category: None,
            value: None,
        })]);

        let serialized = serde_json::to_value(&result).unwrap();
        assert_eq!(serialized, json!({"additions": [{"key": "appliance.ntp"}]}));
    }

    #[test]
    fn test_entry_key_order_on_the_wire() {
        let modification = Modification::new("k", Some("c".to_string()), Some(json!("x")), Some(json!("y")));
        let text = serde_json::to_string(&modification).unwrap();
        assert_eq!(text, r#"{"key":"k","category":"c","current_value":"x","desired_value":"y"}"#);
    }
}
