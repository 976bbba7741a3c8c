//! Tree merge
//!
//! Merges a partial desired document into the current document, producing
//! the complete document submitted as desired state.
//!
//! Rules, applied from the root mapping down:
//! - a desired sequence or scalar replaces whatever is current
//! - a desired key missing from current is imported as-is
//! - a desired `{}` over a non-empty current value removes that key, so the
//!   whole subtree is reported as a deletion upstream
//! - otherwise the two values are merged recursively
//!
//! Keys only present in current are kept.

use super::is_empty_object;
use serde_json::{Map, Value};

/// Merge `desired` into `current`
///
/// A current value that is not a mapping where desired is a mapping is
/// treated as an empty mapping.
pub fn merge(current: Value, desired: Value) -> Value {
    let Value::Object(desired) = desired else {
        return desired;
    };
    if desired.is_empty() {
        return current;
    }

    let mut merged = match current {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    for (key, value) in desired {
        let Some(existing) = merged.get_mut(&key) else {
            merged.insert(key, value);
            continue;
        };

        if is_empty_object(&value) && !is_empty_object(existing) {
            merged.retain(|k, _| k != &key);
            continue;
        }

        let current_value = existing.take();
        *existing = merge(current_value, value);
    }

    Value::Object(merged)
}
