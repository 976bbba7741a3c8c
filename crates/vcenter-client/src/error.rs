//! vCenter client errors

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with the vCenter API
#[derive(Debug, Error)]
pub enum VcenterError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// vCenter API returned an error
    #[error("vCenter API error: {0}")]
    Api(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Session creation failed (bad credentials, locked account, etc.)
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Task did not reach a terminal status in time
    #[error("Timed out after {}s waiting for task {task_id}", timeout.as_secs())]
    TaskTimeout { task_id: String, timeout: Duration },

    /// Task response carried no usable status
    #[error("Invalid status [{status}] for task {task_id}")]
    TaskStatus { task_id: String, status: String },

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
