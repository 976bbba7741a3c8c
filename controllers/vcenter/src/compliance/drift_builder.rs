//! Drift document assembly
//!
//! Turns a task classification (or a failure detected before any task ran)
//! into a `DriftResponse`.

use crate::compliance::classifier::{Classification, TaskError};
use crate::error::{ControllerError, REMEDIATION_CHECK_COMPONENT};
use drift_spec::{current_timestamp, DriftResponse, DriftResult, ErrorRecord, ErrorSource, Target};
use uuid::Uuid;

/// Everything a drift document needs besides the classification itself
#[derive(Debug, Clone)]
pub struct DriftContext {
    /// Controller name, e.g. "ntp"
    pub name: String,
    pub target: Target,
    pub description: String,
    pub timestamp: String,
    /// Id of the compliance task, when one was submitted
    pub task_id: Option<String>,
    /// Source stamped on every error record
    pub source: ErrorSource,
}

impl DriftContext {
    /// Context stamped with the current time
    pub fn new(name: impl Into<String>, target: Target, source: ErrorSource) -> Self {
        Self {
            name: name.into(),
            target,
            description: String::new(),
            timestamp: current_timestamp(),
            task_id: None,
            source,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    /// Point error records at the endpoint that failed
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.source = self.source.with_endpoint(endpoint);
        self
    }

    fn record(&self, error: TaskError) -> ErrorRecord {
        let remediation = error.remediation.unwrap_or_else(|| REMEDIATION_CHECK_COMPONENT.to_string());
        ErrorRecord::at(
            error.timestamp.unwrap_or_else(current_timestamp),
            self.source.clone(),
            error.message,
            Some(remediation),
        )
    }
}

/// UUID encoded in the leading segment of a vCenter task id
///
/// Task ids look like `<uuid>:<service>`. Anything that does not parse
/// yields `None`.
pub fn uuid_from_task_id(task_id: &str) -> Option<Uuid> {
    let head = task_id.split(':').next().unwrap_or(task_id);
    Uuid::parse_str(head).ok()
}

/// Build the drift document for a classified task result
pub fn build_drift_response(ctx: DriftContext, classification: Classification) -> DriftResponse {
    let id = match &ctx.task_id {
        Some(task_id) => uuid_from_task_id(task_id),
        None => Some(Uuid::new_v4()),
    };

    let mut drift = DriftResponse::new(ctx.name.clone(), ctx.target.clone(), ctx.description.clone(), ctx.timestamp.clone());
    drift.id = id;

    match classification {
        Classification::Compliant { summary } => {
            if let Some(message) = summary.message {
                drift.description = message;
            }
            if let Some(end_time) = summary.end_time {
                drift.timestamp = end_time;
            }
        }
        Classification::NonCompliant { summary, diffs } => {
            // Summary-only results carry their drift in the message
            if diffs.is_empty() {
                if let Some(message) = summary.message {
                    drift.description = message;
                }
            }
            drift.set_result(DriftResult::from_entries(diffs));
        }
        Classification::Failed { errors } | Classification::Unknown { errors } => {
            let records = errors.into_iter().map(|error| ctx.record(error)).collect();
            drift.set_errors(records);
        }
    }
    drift
}

/// Failed drift document for an error detected outside task classification
pub fn failed_drift_response(ctx: DriftContext, error: &ControllerError) -> DriftResponse {
    let task_error = TaskError::new(error.to_string()).with_remediation(error.remediation());
    build_drift_response(ctx, Classification::Failed { errors: vec![task_error] })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::classifier::TaskSummary;
    use crate::error::REMEDIATION_CHECK_INPUT;
    use drift_spec::{ComplianceStatus, DiffEntry, Modification, ValueChange};
    use serde_json::json;

    fn context() -> DriftContext {
        DriftContext {
            name: "vc_profile".to_string(),
            target: Target::vcenter("vc.example.com"),
            description: "VC profile compliance".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
            task_id: None,
            source: ErrorSource::new("vcenter", Some("vc.example.com".to_string())),
        }
    }

    #[test]
    fn test_uuid_from_task_id() {
        let expected = Uuid::parse_str("52d0be83-9e2e-7a4e-9e04-d1469959c159").unwrap();

        assert_eq!(
            uuid_from_task_id("52d0be83-9e2e-7a4e-9e04-d1469959c159:com.vmware.x"),
            Some(expected)
        );
        assert_eq!(uuid_from_task_id("52d0be83-9e2e-7a4e-9e04-d1469959c159"), Some(expected));
        assert_eq!(uuid_from_task_id("invalid"), None);
        assert_eq!(uuid_from_task_id(""), None);
    }

    #[test]
    fn test_compliant_overwrites_description_and_timestamp() {
        let summary = TaskSummary {
            message: Some("All hosts compliant".to_string()),
            end_time: Some("2024-02-02T00:00:00Z".to_string()),
        };

        let drift = build_drift_response(context(), Classification::Compliant { summary });

        assert_eq!(drift.status, ComplianceStatus::Compliant);
        assert_eq!(drift.description, "All hosts compliant");
        assert_eq!(drift.timestamp, "2024-02-02T00:00:00Z");
        assert!(drift.result.is_none());
        assert!(drift.errors.is_empty());
    }

    #[test]
    fn test_compliant_without_summary_keeps_context() {
        let drift = build_drift_response(context(), Classification::Compliant { summary: TaskSummary::default() });

        assert_eq!(drift.description, "VC profile compliance");
        assert_eq!(drift.timestamp, "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_non_compliant_partitions_diffs_and_keeps_description() {
        let diffs = vec![
            DiffEntry::Addition(ValueChange {
                key: "appliance.ntp".to_string(),
                category: Some("appliance".to_string()),
                value: Some(json!("10.0.0.1")),
            }),
            DiffEntry::Modification(Modification::new(
                "appliance.timezone",
                Some("appliance".to_string()),
                Some(json!("UTC")),
                Some(json!("PST")),
            )),
        ];
        let summary = TaskSummary {
            message: Some("Drift found".to_string()),
            end_time: None,
        };

        let drift = build_drift_response(context(), Classification::NonCompliant { summary, diffs });
        let value = serde_json::to_value(&drift).unwrap();

        assert_eq!(drift.status, ComplianceStatus::NonCompliant);
        assert_eq!(drift.description, "VC profile compliance");
        assert_eq!(value["result"]["additions"][0]["key"], "appliance.ntp");
        assert_eq!(value["result"]["modifications"][0]["desired_value"], "PST");
        assert!(value["result"].get("deletions").is_none());
        assert!(value.get("errors").is_none());
    }

    #[test]
    fn test_non_compliant_without_diffs_uses_summary_message() {
        let summary = TaskSummary {
            message: Some("2 hosts are out of compliance".to_string()),
            end_time: Some("2024-02-02T00:00:00Z".to_string()),
        };

        let drift = build_drift_response(context(), Classification::NonCompliant { summary, diffs: Vec::new() });
        let value = serde_json::to_value(&drift).unwrap();

        assert_eq!(drift.status, ComplianceStatus::NonCompliant);
        assert_eq!(drift.description, "2 hosts are out of compliance");
        assert_eq!(drift.timestamp, "2024-01-01T00:00:00.000Z");
        assert_eq!(value["result"], json!({}));
    }

    #[test]
    fn test_endpoint_is_stamped_on_error_records() {
        let error = ControllerError::TaskStatus("unexpected".to_string());

        let drift = failed_drift_response(context().with_endpoint("/api/appliance/ntp"), &error);

        assert_eq!(drift.errors[0].source.endpoint.as_deref(), Some("/api/appliance/ntp"));
        assert_eq!(drift.errors[0].source.server.as_deref(), Some("vc.example.com"));
    }

    #[test]
    fn test_failed_errors_get_source_and_default_remediation() {
        let errors = vec![
            TaskError::new("scan failed"),
            TaskError {
                message: "host unreachable".to_string(),
                remediation: Some("Reconnect the host".to_string()),
                timestamp: Some("2024-03-03T00:00:00Z".to_string()),
            },
        ];

        let drift = build_drift_response(context(), Classification::Failed { errors });

        assert_eq!(drift.status, ComplianceStatus::Failed);
        assert!(drift.result.is_none());
        assert_eq!(drift.errors.len(), 2);
        assert_eq!(drift.errors[0].message(), "scan failed");
        assert_eq!(drift.errors[0].source.server.as_deref(), Some("vc.example.com"));
        assert_eq!(
            drift.errors[0].remediation.as_ref().map(|r| r.message.as_str()),
            Some(REMEDIATION_CHECK_COMPONENT)
        );
        assert_eq!(drift.errors[1].timestamp, "2024-03-03T00:00:00Z");
        assert_eq!(
            drift.errors[1].remediation.as_ref().map(|r| r.message.as_str()),
            Some("Reconnect the host")
        );
    }

    #[test]
    fn test_unknown_is_reported_as_failed() {
        let errors = vec![TaskError::new("Unknown status[TEST] for task t-1")];

        let drift = build_drift_response(context(), Classification::Unknown { errors });

        assert_eq!(drift.status, ComplianceStatus::Failed);
        assert_eq!(drift.errors[0].message(), "Unknown status[TEST] for task t-1");
    }

    #[test]
    fn test_id_is_derived_from_task_id_or_generated() {
        let compliant = || Classification::Compliant { summary: TaskSummary::default() };

        let with_task = build_drift_response(
            context().with_task_id("52d0be83-9e2e-7a4e-9e04-d1469959c159:com.vmware.x"),
            compliant(),
        );
        assert_eq!(with_task.id.map(|id| id.to_string()).as_deref(), Some("52d0be83-9e2e-7a4e-9e04-d1469959c159"));

        let bad_task = build_drift_response(context().with_task_id("task-1"), compliant());
        assert!(bad_task.id.is_none());

        let no_task = build_drift_response(context(), compliant());
        assert!(no_task.id.is_some());
    }

    #[test]
    fn test_failed_drift_response_carries_error_remediation() {
        let error = ControllerError::UnsupportedComponent("bogus".to_string());

        let drift = failed_drift_response(context(), &error);

        assert_eq!(drift.status, ComplianceStatus::Failed);
        assert_eq!(drift.errors[0].message(), "Unsupported component: bogus");
        assert_eq!(
            drift.errors[0].remediation.as_ref().map(|r| r.message.as_str()),
            Some(REMEDIATION_CHECK_INPUT)
        );
    }
}
