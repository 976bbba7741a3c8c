//! Template projection
//!
//! Cuts a current document down to the keys and shapes present in a
//! template document. Template leaves are placeholders; only their
//! position matters. Keys the current document does not have are dropped
//! silently.

use serde_json::{Map, Value};

/// Project `current` onto the shape of `template`
///
/// For each template key, in template order:
/// - absent from current: dropped
/// - non-empty mapping over a current mapping: projected recursively
/// - non-empty sequence whose first element is a mapping, over a current
///   sequence: that element is used as a per-item template, so the output
///   has one item per current item (non-mapping items pass through)
/// - anything else: the current value is taken verbatim
///
/// If either side is not a mapping the current document is returned as-is.
pub fn project(current: &Value, template: &Value) -> Value {
    let (Value::Object(current), Value::Object(template)) = (current, template) else {
        return current.clone();
    };

    let mut projected = Map::new();
    for (key, placeholder) in template {
        let Some(value) = current.get(key) else {
            continue;
        };
        projected.insert(key.clone(), project_value(value, placeholder));
    }
    Value::Object(projected)
}

fn project_value(value: &Value, placeholder: &Value) -> Value {
    match (placeholder, value) {
        (Value::Object(sub_template), Value::Object(_)) if !sub_template.is_empty() => {
            project(value, placeholder)
        }
        (Value::Array(template_items), Value::Array(items)) if !template_items.is_empty() => {
            match &template_items[0] {
                Value::Object(_) => Value::Array(
                    items
                        .iter()
                        .map(|item| {
                            if item.is_object() {
                                project(item, &template_items[0])
                            } else {
                                item.clone()
                            }
                        })
                        .collect(),
                ),
                // TODO: per-element filtering for scalar list templates; the whole current list is taken for now
                _ => value.clone(),
            }
        }
        _ => value.clone(),
    }
}
