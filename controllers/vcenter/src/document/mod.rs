//! Schema-less configuration documents.
//!
//! Current and desired configuration are untyped JSON trees
//! (`serde_json::Value`). This module holds the recursive operations on
//! them:
//! - `merge`: fold a partial desired document into a full current one
//! - `template`: cut a current document down to the shape of a template
//! - `diff`: compare a current document against a desired one

pub mod diff;
pub mod merge;
pub mod template;

pub use diff::diff_documents;
pub use merge::merge;
pub use template::project;

use serde_json::Value;

/// True for `{}`
pub(crate) fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(serde_json::Map::is_empty)
}
