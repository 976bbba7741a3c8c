//! Drift Spec Definitions
//!
//! Wire types emitted by the vCenter configuration controllers: the drift
//! document describing how a product's live configuration differs from its
//! desired specification, and the response envelopes returned at the
//! controller boundary.

pub mod diff;
pub mod drift;
pub mod envelope;
pub mod error_record;

pub use diff::*;
pub use drift::*;
pub use envelope::*;
pub use error_record::*;
