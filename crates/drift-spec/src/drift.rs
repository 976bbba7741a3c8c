//! Drift document
//!
//! The normalized description of a compliance check outcome. A drift
//! document carries a `result` only when non-compliant and `errors` only
//! when failed; a compliant document carries neither.

use crate::diff::DriftResult;
use crate::error_record::ErrorRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema version stamped on every drift document
pub const SCHEMA_VERSION: &str = "1.0-DRAFT";

/// Compliance status of a drift document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    NonCompliant,
    Failed,
}

impl ComplianceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplianceStatus::Compliant => "COMPLIANT",
            ComplianceStatus::NonCompliant => "NON_COMPLIANT",
            ComplianceStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for ComplianceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of entity a drift document describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Vcenter,
    Esxi,
    Cluster,
}

/// Entity a drift document describes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub hostname: String,

    #[serde(rename = "type")]
    pub target_type: TargetType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Target {
    pub fn vcenter(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            target_type: TargetType::Vcenter,
            id: None,
        }
    }

    pub fn cluster(hostname: impl Into<String>, cluster_id: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            target_type: TargetType::Cluster,
            id: Some(cluster_id.into()),
        }
    }
}

/// Drift document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftResponse {
    pub schema_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,

    pub name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    pub target: Target,

    pub status: ComplianceStatus,

    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<DriftResult>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorRecord>,
}

impl DriftResponse {
    /// A compliant drift document with no result and no errors
    pub fn new(name: impl Into<String>, target: Target, description: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            id: None,
            name: name.into(),
            description: description.into(),
            target,
            status: ComplianceStatus::Compliant,
            timestamp: timestamp.into(),
            result: None,
            errors: Vec::new(),
        }
    }

    /// Mark non-compliant with the given result, clearing any errors
    pub fn set_result(&mut self, result: DriftResult) {
        self.status = ComplianceStatus::NonCompliant;
        self.result = Some(result);
        self.errors.clear();
    }

    /// Mark failed with the given errors, clearing any result
    pub fn set_errors(&mut self, errors: Vec<ErrorRecord>) {
        self.status = ComplianceStatus::Failed;
        self.result = None;
        self.errors = errors;
    }
}
