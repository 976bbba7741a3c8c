//! Main controller implementation.
//!
//! This module contains the `Controller` struct that runs one operation of
//! one configuration controller against a vCenter:
//! - `get`: read the current configuration
//! - `set`: apply a desired configuration
//! - `check_compliance`: compare current against desired and report drift
//! - `remediate`: apply the desired configuration only when drift is found

use crate::compliance::{failed_drift_response, DriftContext};
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::reconciler::appliance::{ApplianceController, BACKUP_SCHEDULE, DNS, NTP, SYSLOG};
use crate::reconciler::cluster_config::ClusterConfigController;
use crate::reconciler::vc_profile::VcProfileController;
use crate::reconciler::{ConfigController, Reconciler, ERROR_SOURCE_TYPE};
use drift_spec::{ComplianceResponse, ErrorSource, GetResponse, RemediateResponse, SetResponse};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::{error, info};
use vcenter_client::{VcenterClient, SESSION_PATH};

/// Configuration controllers this binary can run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerKind {
    VcProfile,
    ClusterConfig,
    Dns,
    Ntp,
    Syslog,
    BackupSchedule,
}

impl ControllerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerKind::VcProfile => "vc_profile",
            ControllerKind::ClusterConfig => "cluster_config",
            ControllerKind::Dns => "dns",
            ControllerKind::Ntp => "ntp",
            ControllerKind::Syslog => "syslog",
            ControllerKind::BackupSchedule => "backup_schedule",
        }
    }

    /// Build the controller; `cluster_config` needs a cluster id
    pub fn build(self, cluster_id: Option<&str>) -> Result<Box<dyn ConfigController>, ControllerError> {
        Ok(match self {
            ControllerKind::VcProfile => Box::new(VcProfileController),
            ControllerKind::ClusterConfig => {
                let cluster_id = cluster_id.ok_or_else(|| {
                    ControllerError::InvalidConfig("cluster_config requires a cluster id".to_string())
                })?;
                Box::new(ClusterConfigController::new(cluster_id))
            }
            ControllerKind::Dns => Box::new(ApplianceController::new(&DNS)),
            ControllerKind::Ntp => Box::new(ApplianceController::new(&NTP)),
            ControllerKind::Syslog => Box::new(ApplianceController::new(&SYSLOG)),
            ControllerKind::BackupSchedule => Box::new(ApplianceController::new(&BACKUP_SCHEDULE)),
        })
    }
}

impl FromStr for ControllerKind {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vc_profile" => Ok(ControllerKind::VcProfile),
            "cluster_config" => Ok(ControllerKind::ClusterConfig),
            "dns" => Ok(ControllerKind::Dns),
            "ntp" => Ok(ControllerKind::Ntp),
            "syslog" => Ok(ControllerKind::Syslog),
            "backup_schedule" => Ok(ControllerKind::BackupSchedule),
            other => Err(ControllerError::UnsupportedController(other.to_string())),
        }
    }
}

impl fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Controller operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Get,
    Set,
    CheckCompliance,
    Remediate,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Set => "set",
            Operation::CheckCompliance => "check_compliance",
            Operation::Remediate => "remediate",
        }
    }

    /// Whether the operation needs a desired spec (`get` only takes an optional template)
    pub fn requires_desired(&self) -> bool {
        !matches!(self, Operation::Get)
    }
}

impl FromStr for Operation {
    type Err = ControllerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(Operation::Get),
            "set" => Ok(Operation::Set),
            "check_compliance" => Ok(Operation::CheckCompliance),
            "remediate" => Ok(Operation::Remediate),
            other => Err(ControllerError::UnsupportedOperation(other.to_string())),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response of whichever operation was run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OperationOutput {
    Get(GetResponse),
    Set(SetResponse),
    Compliance(ComplianceResponse),
    Remediate(RemediateResponse),
}

impl OperationOutput {
    /// Output of `operation` when it could not run at all
    pub fn failed(operation: Operation, ctx: DriftContext, error: &ControllerError) -> Self {
        match operation {
            Operation::Get => OperationOutput::Get(GetResponse::failed(error.to_string())),
            Operation::Set => OperationOutput::Set(SetResponse::failed(vec![error.to_string()])),
            Operation::CheckCompliance => {
                OperationOutput::Compliance(ComplianceResponse::from(failed_drift_response(ctx, error)))
            }
            Operation::Remediate => OperationOutput::Remediate(RemediateResponse::failed(vec![error.to_string()])),
        }
    }
}

/// Runs controller operations against one vCenter
pub struct Controller {
    reconciler: Reconciler,
    controller: Box<dyn ConfigController>,
}

impl Controller {
    pub fn new(reconciler: Reconciler, controller: Box<dyn ConfigController>) -> Self {
        Self { reconciler, controller }
    }

    /// Run `operation`; `desired` is the desired spec, or the template for `get`
    pub async fn execute(&self, operation: Operation, desired: Option<&Value>) -> Result<OperationOutput, ControllerError> {
        info!(
            "Running {} {} on {}",
            self.controller.name(),
            operation,
            self.reconciler.hostname()
        );

        let reconciler = &self.reconciler;
        Ok(match (operation, desired) {
            (Operation::Get, template) => OperationOutput::Get(self.controller.get(reconciler, template).await),
            (_, None) => {
                return Err(ControllerError::Validation(format!("{} requires a desired spec", operation)));
            }
            (Operation::Set, Some(desired)) => OperationOutput::Set(self.controller.set(reconciler, desired).await),
            (Operation::CheckCompliance, Some(desired)) => {
                OperationOutput::Compliance(self.controller.check_compliance(reconciler, desired).await)
            }
            (Operation::Remediate, Some(desired)) => {
                OperationOutput::Remediate(self.controller.remediate(reconciler, desired).await)
            }
        })
    }

    /// Release the vCenter session
    pub async fn close(&self) {
        self.reconciler.close().await;
    }
}

/// Connect, run the configured operation and disconnect
///
/// A failure to reach vCenter is reported in the operation's output.
/// Only configuration problems are returned as errors.
pub async fn run(config: &ControllerConfig, desired: Option<&Value>) -> Result<OperationOutput, ControllerError> {
    let configuration = config.controller.build(config.cluster_id.as_deref())?;
    if config.operation.requires_desired() && desired.is_none() {
        return Err(ControllerError::InvalidConfig(format!(
            "{} requires a desired spec",
            config.operation
        )));
    }

    let client = match VcenterClient::connect(&config.context).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to {}: {}", config.context.hostname, e);
            let hostname = config.context.hostname.clone();
            let ctx = DriftContext::new(
                configuration.name(),
                configuration.target(&hostname),
                ErrorSource::new(ERROR_SOURCE_TYPE, Some(hostname.clone())).with_endpoint(SESSION_PATH),
            )
            .with_description(configuration.description());
            return Ok(OperationOutput::failed(config.operation, ctx, &ControllerError::from(e)));
        }
    };

    let controller = Controller::new(
        Reconciler::new(client, config.poll_interval, config.task_timeout),
        configuration,
    );
    let output = controller.execute(config.operation, desired).await;
    controller.close().await;
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use drift_spec::{ComplianceStatus, RemediateStatus, Target};
    use serde_json::json;

    #[test]
    fn test_controller_kind_round_trip() {
        for name in ["vc_profile", "cluster_config", "dns", "ntp", "syslog", "backup_schedule"] {
            let kind: ControllerKind = name.parse().unwrap();
            assert_eq!(kind.to_string(), name);
        }
        assert!(matches!(
            "firewall".parse::<ControllerKind>(),
            Err(ControllerError::UnsupportedController(_))
        ));
    }

    #[test]
    fn test_operation_parsing() {
        assert_eq!("CHECK_COMPLIANCE".parse::<Operation>().unwrap(), Operation::CheckCompliance);
        assert!(!Operation::Get.requires_desired());
        assert!(Operation::Remediate.requires_desired());
        assert!(matches!("delete".parse::<Operation>(), Err(ControllerError::UnsupportedOperation(_))));
    }

    #[test]
    fn test_cluster_controller_needs_cluster_id() {
        assert!(ControllerKind::ClusterConfig.build(None).is_err());
        let controller = ControllerKind::ClusterConfig.build(Some("domain-c8")).unwrap();
        assert_eq!(controller.target("vc"), Target::cluster("vc", "domain-c8"));
    }

    #[tokio::test]
    async fn test_execute_check_compliance_output() {
        let (client, reconciler) = create_test_reconciler();
        client.set_document("/api/appliance/ntp", json!(["time1.example.com"]));
        let controller = Controller::new(reconciler, ControllerKind::Ntp.build(None).unwrap());

        let output = controller
            .execute(Operation::CheckCompliance, Some(&json!(["time1.example.com"])))
            .await
            .unwrap();

        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["status"], "COMPLIANT");
        assert_eq!(value["result"]["schema_version"], "1.0-DRAFT");
        assert_eq!(value["result"]["target"], json!({"hostname": TEST_HOSTNAME, "type": "vcenter"}));
    }

    #[tokio::test]
    async fn test_execute_set_without_desired_is_rejected() {
        let (client, reconciler) = create_test_reconciler();
        let controller = Controller::new(reconciler, ControllerKind::Dns.build(None).unwrap());

        let error = controller.execute(Operation::Set, None).await.unwrap_err();

        assert!(matches!(error, ControllerError::Validation(_)));
        assert!(client.requests().is_empty());
    }

    #[test]
    fn test_failed_output_per_operation() {
        let ctx = DriftContext::new("dns", Target::vcenter("vc"), ErrorSource::new("vcenter", Some("vc".to_string())));
        let error = ControllerError::Transport(vcenter_client::VcenterError::Api("unreachable".to_string()));

        match OperationOutput::failed(Operation::CheckCompliance, ctx.clone(), &error) {
            OperationOutput::Compliance(response) => {
                assert_eq!(response.status, ComplianceStatus::Failed);
                assert!(response.message.is_some());
            }
            other => panic!("unexpected output: {:?}", other),
        }
        match OperationOutput::failed(Operation::Remediate, ctx, &error) {
            OperationOutput::Remediate(response) => assert_eq!(response.status, RemediateStatus::Failed),
            other => panic!("unexpected output: {:?}", other),
        }
    }
}
