//! Configuration controllers
//!
//! This module is organized by vCenter product area:
//! - `vc_profile`: vCenter configuration profile (desired-state scan and apply tasks)
//! - `cluster_config`: ESXi cluster configuration (check-compliance, import and apply tasks)
//! - `appliance`: appliance settings compared locally (DNS, NTP, syslog, backup schedules)

pub mod appliance;
pub mod cluster_config;
pub mod vc_profile;

#[cfg(test)]
mod cluster_config_test;

use crate::compliance::{classify, failed_drift_response, DriftContext, TaskResultProbe};
use crate::error::ControllerError;
use drift_spec::{
    ComplianceResponse, ComplianceStatus, ErrorSource, GetResponse, RemediateResponse, RemediateStatus, SetResponse,
    Target,
};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info, warn};
use vcenter_client::{wait_for_task, VcenterClientTrait, TASK_SUCCEEDED};

/// Source type stamped on error records
pub(crate) const ERROR_SOURCE_TYPE: &str = "vcenter";

/// Shared state for all controllers: the vCenter client and task timing
pub struct Reconciler {
    pub(crate) client: Box<dyn VcenterClientTrait>,
    pub(crate) poll_interval: Duration,
    pub(crate) task_timeout: Duration,
}

impl Reconciler {
    /// Creates a new reconciler instance.
    pub fn new(client: impl VcenterClientTrait + 'static, poll_interval: Duration, task_timeout: Duration) -> Self {
        Self {
            client: Box::new(client),
            poll_interval,
            task_timeout,
        }
    }

    pub fn hostname(&self) -> &str {
        self.client.hostname()
    }

    pub(crate) fn error_source(&self) -> ErrorSource {
        ErrorSource::new(ERROR_SOURCE_TYPE, Some(self.hostname().to_string()))
    }

    /// Submit a task and wait for it to reach a terminal status
    ///
    /// Returns the task id together with the terminal task response.
    pub(crate) async fn run_task(&self, path: &str, body: &Value) -> Result<(String, Value), ControllerError> {
        let task_id = self.client.post_task(path, body).await?;
        info!("Submitted task {} ({})", task_id, path);

        let response = wait_for_task(self.client.as_ref(), &task_id, self.poll_interval, self.task_timeout).await?;
        Ok((task_id, response))
    }

    /// Release the vCenter session
    pub async fn close(&self) {
        if let Err(e) = self.client.close().await {
            warn!("Failed to close session with {}: {}", self.hostname(), e);
        }
    }
}

/// A configuration controller for one vCenter product area
///
/// No operation returns an error: every failure is folded into the
/// operation's response.
#[async_trait::async_trait]
pub trait ConfigController: Send + Sync {
    /// Name used in drift documents and logs
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn target(&self, hostname: &str) -> Target {
        Target::vcenter(hostname)
    }

    /// Current configuration, projected through `template` when given
    async fn get(&self, reconciler: &Reconciler, template: Option<&Value>) -> GetResponse;

    /// Apply `desired` on top of the current configuration
    async fn set(&self, reconciler: &Reconciler, desired: &Value) -> SetResponse;

    /// Compare the current configuration against `desired`
    async fn check_compliance(&self, reconciler: &Reconciler, desired: &Value) -> ComplianceResponse;

    /// Check compliance and apply `desired` only when drift was found
    async fn remediate(&self, reconciler: &Reconciler, desired: &Value) -> RemediateResponse {
        let compliance = self.check_compliance(reconciler, desired).await;
        match compliance.status {
            ComplianceStatus::Compliant => {
                info!("{} is compliant, nothing to remediate", self.name());
                RemediateResponse::skipped()
            }
            ComplianceStatus::Failed => RemediateResponse::failed(drift_error_messages(&compliance)),
            ComplianceStatus::NonCompliant => {
                let changes = compliance.drift().and_then(|drift| drift.result.clone());
                let set = self.set(reconciler, desired).await;
                match set.status {
                    RemediateStatus::Success => {
                        info!("Remediated {} on {}", self.name(), reconciler.hostname());
                        RemediateResponse {
                            status: RemediateStatus::Success,
                            changes,
                            errors: Vec::new(),
                        }
                    }
                    _ => RemediateResponse::failed(set.errors),
                }
            }
        }
    }

    /// Drift context for this controller against the reconciler's vCenter
    fn drift_context(&self, reconciler: &Reconciler) -> DriftContext {
        DriftContext::new(self.name(), self.target(reconciler.hostname()), reconciler.error_source())
            .with_description(self.description())
    }
}

fn drift_error_messages(compliance: &ComplianceResponse) -> Vec<String> {
    compliance
        .drift()
        .map(|drift| drift.errors.iter().map(|e| e.message().to_string()).collect())
        .unwrap_or_default()
}

/// FAILED compliance envelope for an error detected before classification
///
/// Errors raised by vCenter are stamped with `endpoint`, the call that failed.
pub(crate) fn compliance_failure(ctx: DriftContext, endpoint: &str, error: ControllerError) -> ComplianceResponse {
    error!("Compliance check for {} failed: {}", ctx.name, error);
    let ctx = if error.is_remote() { ctx.with_endpoint(endpoint) } else { ctx };
    ComplianceResponse::from(failed_drift_response(ctx, &error))
}

/// Outcome of a configuration task submitted by `set`
pub(crate) fn set_outcome(response: &Value, probe: &TaskResultProbe, task_id: &str) -> SetResponse {
    if response.get("status").and_then(Value::as_str) == Some(TASK_SUCCEEDED) {
        return SetResponse::success();
    }
    let classification = classify(response, probe, task_id);
    let errors = classification.errors().iter().map(|e| e.message.clone()).collect();
    error!("Task {} did not succeed", task_id);
    SetResponse::failed(errors)
}

/// The desired document as a non-empty mapping
pub(crate) fn require_mapping<'a>(
    desired: &'a Value,
    what: &str,
) -> Result<&'a serde_json::Map<String, Value>, ControllerError> {
    match desired.as_object() {
        Some(map) if !map.is_empty() => Ok(map),
        Some(_) => Err(ControllerError::Validation(format!("desired {} is empty", what))),
        None => Err(ControllerError::Validation(format!("desired {} must be a mapping", what))),
    }
}
