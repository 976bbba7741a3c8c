//! Error records carried by failed drift documents

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Where an error was observed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSource {
    /// Product type (e.g., "vcenter")
    #[serde(rename = "type")]
    pub source_type: String,

    /// Hostname of the server that produced the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,

    /// Endpoint that was being called
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl ErrorSource {
    pub fn new(source_type: impl Into<String>, server: Option<String>) -> Self {
        Self {
            source_type: source_type.into(),
            server,
            endpoint: None,
        }
    }

    /// Same source, pointing at a specific endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// `{"message": ...}` wrapper used for both the error and its remediation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

/// A single error attached to a failed drift document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: String,
    pub source: ErrorSource,
    pub error: ErrorMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<ErrorMessage>,
}

impl ErrorRecord {
    /// Create an error record stamped with the current time
    pub fn new(source: ErrorSource, message: impl Into<String>, remediation: Option<String>) -> Self {
        Self::at(current_timestamp(), source, message, remediation)
    }

    /// Create an error record with an explicit timestamp
    pub fn at(
        timestamp: impl Into<String>,
        source: ErrorSource,
        message: impl Into<String>,
        remediation: Option<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            source,
            error: ErrorMessage { message: message.into() },
            remediation: remediation.map(|message| ErrorMessage { message }),
        }
    }

    pub fn message(&self) -> &str {
        &self.error.message
    }
}

/// Current UTC time in the RFC 3339 form used across drift documents
pub fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
