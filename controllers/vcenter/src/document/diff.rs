//! Local document diff
//!
//! Compares a current document against a desired one for settings whose
//! compliance is computed locally instead of by a vCenter scan task. Only
//! keys present in the desired document are examined.

use drift_spec::{DiffEntry, Modification, ValueChange};
use serde_json::Value;

/// Diff `current` against `desired`, naming entries by dotted path under `root`
///
/// - desired key missing from current: addition
/// - two lists of scalars: compared as multisets (unmatched desired items
///   are additions, unmatched current items are deletions)
/// - any other differing value: modification
pub fn diff_documents(current: &Value, desired: &Value, root: &str, category: Option<&str>) -> Vec<DiffEntry> {
    let mut entries = Vec::new();
    walk(root, current, desired, category, &mut entries);
    entries
}

fn walk(path: &str, current: &Value, desired: &Value, category: Option<&str>, out: &mut Vec<DiffEntry>) {
    match (current, desired) {
        (Value::Object(current), Value::Object(desired)) => {
            for (key, desired_value) in desired {
                let child = join(path, key);
                match current.get(key) {
                    Some(current_value) => walk(&child, current_value, desired_value, category, out),
                    None => out.push(DiffEntry::Addition(change(child, category, desired_value))),
                }
            }
        }
        (Value::Array(current_items), Value::Array(desired_items))
            if all_scalars(current_items) && all_scalars(desired_items) =>
        {
            let mut unmatched: Vec<&Value> = current_items.iter().collect();
            let mut additions = Vec::new();
            for item in desired_items {
                match unmatched.iter().position(|candidate| *candidate == item) {
                    Some(index) => {
                        unmatched.remove(index);
                    }
                    None => additions.push(item),
                }
            }
            for item in additions {
                out.push(DiffEntry::Addition(change(path.to_string(), category, item)));
            }
            for item in unmatched {
                out.push(DiffEntry::Deletion(change(path.to_string(), category, item)));
            }
        }
        _ if current != desired => out.push(DiffEntry::Modification(Modification::new(
            path,
            category.map(str::to_string),
            Some(current.clone()),
            Some(desired.clone()),
        ))),
        _ => {}
    }
}

fn change(key: String, category: Option<&str>, value: &Value) -> ValueChange {
    ValueChange {
        key,
        category: category.map(str::to_string),
        value: Some(value.clone()),
    }
}

fn all_scalars(items: &[Value]) -> bool {
    items.iter().all(|item| !item.is_object() && !item.is_array())
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}
