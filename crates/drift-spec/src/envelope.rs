//! Controller boundary envelopes
//!
//! Every controller operation returns one of these. None of them represent
//! an exceptional path: failures are encoded in the `status` field and the
//! accompanying errors.

use crate::diff::DriftResult;
use crate::drift::{ComplianceStatus, DriftResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope returned by `check_compliance`
///
/// Compliant and non-compliant drift documents are wrapped under `result`;
/// failed ones under `message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceResponse {
    pub status: ComplianceStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<DriftResponse>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<DriftResponse>,
}

impl ComplianceResponse {
    /// The wrapped drift document, whichever key carries it
    pub fn drift(&self) -> Option<&DriftResponse> {
        self.result.as_ref().or(self.message.as_ref())
    }
}

impl From<DriftResponse> for ComplianceResponse {
    fn from(drift: DriftResponse) -> Self {
        match drift.status {
            ComplianceStatus::Failed => Self {
                status: ComplianceStatus::Failed,
                result: None,
                message: Some(drift),
            },
            status => Self {
                status,
                result: Some(drift),
                message: None,
            },
        }
    }
}

/// Outcome of a `set` or `remediate` operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemediateStatus {
    Success,
    Failed,
    Skipped,
}

/// Envelope returned by `get`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetResponse {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub result: Value,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl GetResponse {
    pub fn ok(result: Value) -> Self {
        Self { result, errors: Vec::new() }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            result: Value::Null,
            errors: vec![error.into()],
        }
    }
}

/// Envelope returned by `set`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetResponse {
    pub status: RemediateStatus,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl SetResponse {
    pub fn success() -> Self {
        Self { status: RemediateStatus::Success, errors: Vec::new() }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self { status: RemediateStatus::Failed, errors }
    }
}

/// Envelope returned by `remediate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediateResponse {
    pub status: RemediateStatus,

    /// Drift that was corrected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changes: Option<DriftResult>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl RemediateResponse {
    pub fn skipped() -> Self {
        Self { status: RemediateStatus::Skipped, changes: None, errors: Vec::new() }
    }

    pub fn failed(errors: Vec<String>) -> Self {
        Self { status: RemediateStatus::Failed, changes: None, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drift::Target;
    use crate::error_record::{ErrorRecord, ErrorSource};

    #[test]
    fn test_failed_drift_is_wrapped_under_message() {
        let mut drift = DriftResponse::new("ntp", Target::vcenter("vc"), "", "t");
        drift.set_errors(vec![ErrorRecord::new(ErrorSource::new("vcenter", None), "boom", None)]);

        let response = ComplianceResponse::from(drift);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["status"], "FAILED");
        assert!(value.get("result").is_none());
        assert_eq!(value["message"]["errors"][0]["error"]["message"], "boom");
    }

    #[test]
    fn test_compliant_drift_is_wrapped_under_result() {
        let drift = DriftResponse::new("ntp", Target::vcenter("vc"), "", "t");
        let response = ComplianceResponse::from(drift);
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["status"], "COMPLIANT");
        assert_eq!(value["result"]["name"], "ntp");
        assert!(value.get("message").is_none());
        assert!(response.drift().is_some());
    }

    #[test]
    fn test_set_response_serialization() {
        let value = serde_json::to_value(SetResponse::success()).unwrap();
        assert_eq!(value, serde_json::json!({"status": "SUCCESS"}));
    }
}
