//! Compliance task handling
//!
//! Classifies the terminal response of a compliance-check task and turns
//! the result into a drift document.

pub mod classifier;
pub mod drift_builder;


pub use classifier::{classify, Classification, TaskResultProbe, TaskSummary, CLUSTER_CONFIG_PROBE, VC_PROFILE_PROBE};
pub use drift_builder::{build_drift_response, failed_drift_response, DriftContext};
