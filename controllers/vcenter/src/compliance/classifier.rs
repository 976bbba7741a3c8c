//! Task result classification
//!
//! Turns the terminal response of a compliance-check task into a verdict
//! and its payload: a diff list for non-compliant VC profile scans, an
//! error list for failures.
//!
//! The task APIs are not uniform across products. The compliance verdict
//! lives under a different field name per product, and notifications may
//! be nested under `result` or sit at the top level. A `TaskResultProbe`
//! names where to look for each product; `result.notifications` is always
//! probed before top-level `notifications`.

use drift_spec::{DiffEntry, Modification, ValueChange};
use serde_json::Value;
use tracing::{debug, warn};
use vcenter_client::TASK_SUCCEEDED;

/// Where a task response may carry its notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLocation {
    /// `result.notifications`
    Result,
    /// top-level `notifications`
    TopLevel,
}

impl NotificationLocation {
    fn lookup(self, response: &Value) -> Option<&Value> {
        match self {
            NotificationLocation::Result => response.get("result").and_then(|r| r.get("notifications")),
            NotificationLocation::TopLevel => response.get("notifications"),
        }
    }
}

/// How a non-compliant result describes its drift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffSource {
    /// `result.compliance_result[].value.diff_results[].value` records
    ComplianceResults,
    /// Only a summary message is returned
    SummaryOnly,
}

/// Field table describing one product's task result layout
#[derive(Debug, Clone, Copy)]
pub struct TaskResultProbe {
    /// Field under `result` carrying the compliance verdict
    pub verdict_field: &'static str,
    /// Notification locations, in probe order
    pub notification_locations: &'static [NotificationLocation],
    pub diff_source: DiffSource,
}

const NOTIFICATION_PROBE_ORDER: &[NotificationLocation] = &[NotificationLocation::Result, NotificationLocation::TopLevel];

/// VC profile `scan-desired-state` tasks
pub const VC_PROFILE_PROBE: TaskResultProbe = TaskResultProbe {
    verdict_field: "status",
    notification_locations: NOTIFICATION_PROBE_ORDER,
    diff_source: DiffSource::ComplianceResults,
};

/// ESXi cluster configuration `check-compliance` tasks
pub const CLUSTER_CONFIG_PROBE: TaskResultProbe = TaskResultProbe {
    verdict_field: "cluster_status",
    notification_locations: NOTIFICATION_PROBE_ORDER,
    diff_source: DiffSource::SummaryOnly,
};

/// Compliance verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Compliant,
    NonCompliant,
    Failed,
    Unknown,
}

/// An error extracted from a task response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskError {
    pub message: String,
    pub remediation: Option<String>,
    /// Time reported by vCenter, when the error carried one
    pub timestamp: Option<String>,
}

impl TaskError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            remediation: None,
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }
}

/// Summary of a finished task
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub message: Option<String>,
    pub end_time: Option<String>,
}

/// Verdict plus payload
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Compliant { summary: TaskSummary },
    NonCompliant { summary: TaskSummary, diffs: Vec<DiffEntry> },
    Failed { errors: Vec<TaskError> },
    Unknown { errors: Vec<TaskError> },
}

impl Classification {
    pub fn verdict(&self) -> Verdict {
        match self {
            Classification::Compliant { .. } => Verdict::Compliant,
            Classification::NonCompliant { .. } => Verdict::NonCompliant,
            Classification::Failed { .. } => Verdict::Failed,
            Classification::Unknown { .. } => Verdict::Unknown,
        }
    }

    /// Errors carried by a failed or unknown classification
    pub fn errors(&self) -> &[TaskError] {
        match self {
            Classification::Failed { errors } | Classification::Unknown { errors } => errors,
            _ => &[],
        }
    }
}

/// Classify the terminal response of task `task_id`
pub fn classify(response: &Value, probe: &TaskResultProbe, task_id: &str) -> Classification {
    let task_status = response.get("status").and_then(Value::as_str);
    if task_status != Some(TASK_SUCCEEDED) {
        debug!("Task {} did not succeed (status {:?})", task_id, task_status);
        return Classification::Failed {
            errors: failed_task_errors(response, probe, task_id),
        };
    }

    let Some(result) = response.get("result").filter(|r| r.is_object()) else {
        return malformed(response, task_id);
    };
    let Some(verdict) = result.get(probe.verdict_field).and_then(Value::as_str) else {
        return malformed(response, task_id);
    };

    match verdict.to_ascii_uppercase().as_str() {
        "COMPLIANT" => Classification::Compliant {
            summary: task_summary(response),
        },
        "NON_COMPLIANT" | "NOT_COMPLIANT" => {
            let diffs = match probe.diff_source {
                DiffSource::ComplianceResults => flatten_diffs(result),
                DiffSource::SummaryOnly => Vec::new(),
            };
            Classification::NonCompliant {
                summary: task_summary(response),
                diffs,
            }
        }
        "UNAVAILABLE" | "FAILED" => Classification::Failed {
            errors: notification_errors(response, probe, verdict, task_id),
        },
        _ => {
            warn!("Unknown status {} for task {}", verdict, task_id);
            Classification::Unknown {
                errors: vec![TaskError::new(unknown_status_message(verdict, task_id))],
            }
        }
    }
}

fn unknown_status_message(status: &str, task_id: &str) -> String {
    format!("Unknown status[{}] for task {}", status, task_id)
}

fn malformed(response: &Value, task_id: &str) -> Classification {
    warn!("Malformed response for task {}", task_id);
    Classification::Failed {
        errors: vec![malformed_error(response)],
    }
}

fn malformed_error(response: &Value) -> TaskError {
    TaskError::new(format!("Malformed task response: {}", response))
}

/// Errors for a task whose own status is not SUCCEEDED
///
/// Probe order: `error.messages[]`, then `error` itself, then
/// `result.notifications.errors`, then a malformed-response error.
fn failed_task_errors(response: &Value, probe: &TaskResultProbe, task_id: &str) -> Vec<TaskError> {
    if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
        if let Some(messages) = error.get("messages").and_then(Value::as_array).filter(|m| !m.is_empty()) {
            return messages.iter().map(|m| TaskError::new(message_text(m))).collect();
        }
        return vec![TaskError::new(message_text(error))];
    }

    let status = response.get("status").and_then(Value::as_str).unwrap_or("FAILED");
    let has_result_notification_errors = NotificationLocation::Result
        .lookup(response)
        .and_then(|n| n.get("errors"))
        .is_some();
    if has_result_notification_errors {
        return notification_errors(response, probe, status, task_id);
    }

    vec![malformed_error(response)]
}

/// Errors from the first notifications block found along the probe order
fn notification_errors(response: &Value, probe: &TaskResultProbe, status: &str, task_id: &str) -> Vec<TaskError> {
    let Some(notifications) = probe
        .notification_locations
        .iter()
        .find_map(|location| location.lookup(response))
    else {
        return vec![TaskError::new(unknown_status_message(status, task_id))];
    };

    let errors: Vec<TaskError> = notifications
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| errors.iter().map(notification_error).collect())
        .unwrap_or_default();

    if errors.is_empty() {
        return vec![TaskError::new(format!(
            "Status[{}] reported for task {} without error details",
            status, task_id
        ))];
    }
    errors
}

fn notification_error(notification: &Value) -> TaskError {
    let message = notification
        .get("message")
        .map(message_text)
        .unwrap_or_else(|| message_text(notification));
    TaskError {
        message,
        remediation: notification.get("resolution").map(message_text),
        timestamp: notification.get("time").and_then(Value::as_str).map(str::to_string),
    }
}

/// Human-readable text of a localizable message, string, or arbitrary value
fn message_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(map) => map
            .get("default_message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| map.get("message").map(message_text))
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

fn task_summary(response: &Value) -> TaskSummary {
    let result = response.get("result");
    let lookup = |field: &str| result.and_then(|r| r.get(field)).or_else(|| response.get(field));
    TaskSummary {
        message: lookup("summary").filter(|s| !s.is_null()).map(message_text),
        end_time: lookup("end_time").and_then(Value::as_str).map(str::to_string),
    }
}

/// `(key, value)` pairs of a VAPI map, serialized either as an object or as
/// a list of `{"key": .., "value": ..}` entries
fn map_entries(value: &Value) -> Vec<(Option<&str>, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (Some(k.as_str()), v)).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| {
                let value = item.get("value")?;
                Some((item.get("key").and_then(Value::as_str), value))
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn flatten_diffs(result: &Value) -> Vec<DiffEntry> {
    let Some(components) = result.get("compliance_result") else {
        return Vec::new();
    };

    let mut entries = Vec::new();
    for (component, compliance) in map_entries(components) {
        let Some(diff_results) = compliance.get("diff_results") else {
            continue;
        };
        for (diff_key, record) in map_entries(diff_results) {
            entries.push(diff_entry(record, diff_key, component));
        }
    }
    entries
}

fn diff_entry(record: &Value, fallback_key: Option<&str>, component: Option<&str>) -> DiffEntry {
    let text = |field: &str| record.get(field).and_then(Value::as_str);
    let present = |field: &str| record.get(field).filter(|v| !v.is_null()).cloned();

    let key = text("key").or_else(|| text("path")).or(fallback_key).unwrap_or_default().to_string();
    let category = text("category").or(component).map(str::to_string);
    let description = record.get("description").map(message_text).unwrap_or_default();

    if description.contains("Added") {
        DiffEntry::Addition(ValueChange {
            key,
            category,
            value: present("desired_value").or_else(|| present("current_value")),
        })
    } else if description.contains("Removed") {
        DiffEntry::Deletion(ValueChange {
            key,
            category,
            value: present("current_value").or_else(|| present("desired_value")),
        })
    } else {
        DiffEntry::Modification(Modification::new(key, category, present("current_value"), present("desired_value")))
    }
}
