//! ESXi cluster configuration controller
//!
//! Compliance has two halves. The desired document is diffed locally against
//! the cluster's stored configuration, and vCenter's check-compliance task
//! compares the hosts against that stored configuration. The cluster is
//! compliant only when both agree. Setting a configuration imports the
//! merged document and then applies it to the cluster's hosts.

use super::{compliance_failure, require_mapping, set_outcome, ConfigController, Reconciler};
use crate::compliance::{build_drift_response, classify, Classification, CLUSTER_CONFIG_PROBE};
use crate::document::{diff_documents, merge, project};
use crate::error::ControllerError;
use drift_spec::{ComplianceResponse, GetResponse, SetResponse, Target};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use vcenter_client::TASK_SUCCEEDED;

pub struct ClusterConfigController {
    cluster_id: String,
}

impl ClusterConfigController {
    pub fn new(cluster_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
        }
    }

    fn config_path(&self) -> String {
        format!("/api/esx/settings/clusters/{}/configuration", self.cluster_id)
    }

    fn action_path(&self, action: &str) -> String {
        format!("{}?action={}&vmw-task=true", self.config_path(), action)
    }

    /// Current cluster configuration as a document
    ///
    /// The configuration may come back as JSON text under `config`; it is
    /// decoded so callers always see a mapping.
    async fn current_configuration(&self, reconciler: &Reconciler) -> Result<Value, ControllerError> {
        let response = reconciler.client.get(&self.config_path()).await?;
        match response.get("config").and_then(Value::as_str) {
            Some(text) => serde_json::from_str(text).map_err(|e| {
                ControllerError::MalformedResponse(format!(
                    "cluster {} configuration is not valid JSON: {}",
                    self.cluster_id, e
                ))
            }),
            None => Ok(response),
        }
    }

    /// Import the merged configuration, then apply it
    ///
    /// Returns the id and response of the first task that did not succeed,
    /// or of the apply task.
    async fn import_and_apply(&self, reconciler: &Reconciler, desired: &Value) -> Result<(String, Value), ControllerError> {
        require_mapping(desired, "cluster configuration")?;
        let current = self.current_configuration(reconciler).await?;
        let merged = merge(current, desired.clone());

        let (task_id, response) = reconciler
            .run_task(&self.action_path("import"), &json!({ "config": merged.to_string() }))
            .await?;
        if response.get("status").and_then(Value::as_str) != Some(TASK_SUCCEEDED) {
            warn!("Import task {} for cluster {} did not succeed", task_id, self.cluster_id);
            return Ok((task_id, response));
        }
        info!("Imported configuration into cluster {}", self.cluster_id);

        reconciler.run_task(&self.action_path("apply"), &json!({})).await
    }
}

#[async_trait::async_trait]
impl ConfigController for ClusterConfigController {
    fn name(&self) -> &'static str {
        "cluster_config"
    }

    fn description(&self) -> &'static str {
        "ESXi cluster configuration compliance"
    }

    fn target(&self, hostname: &str) -> Target {
        Target::cluster(hostname, self.cluster_id.clone())
    }

    async fn get(&self, reconciler: &Reconciler, template: Option<&Value>) -> GetResponse {
        match self.current_configuration(reconciler).await {
            Ok(current) => GetResponse::ok(match template {
                Some(template) => project(&current, template),
                None => current,
            }),
            Err(e) => GetResponse::failed(e.to_string()),
        }
    }

    async fn set(&self, reconciler: &Reconciler, desired: &Value) -> SetResponse {
        match self.import_and_apply(reconciler, desired).await {
            Ok((task_id, response)) => set_outcome(&response, &CLUSTER_CONFIG_PROBE, &task_id),
            Err(e) => SetResponse::failed(vec![e.to_string()]),
        }
    }

    async fn check_compliance(&self, reconciler: &Reconciler, desired: &Value) -> ComplianceResponse {
        let ctx = self.drift_context(reconciler);
        let config_path = self.config_path();
        if let Err(e) = require_mapping(desired, "cluster configuration") {
            return compliance_failure(ctx, &config_path, e);
        }

        let current = match self.current_configuration(reconciler).await {
            Ok(current) => current,
            Err(e) => return compliance_failure(ctx, &config_path, e),
        };
        let local_diffs = diff_documents(&project(&current, desired), desired, "", Some(self.name()));
        debug!("Cluster {} stored configuration has {} differences", self.cluster_id, local_diffs.len());

        let check_path = self.action_path("check-compliance");
        let (task_id, response) = match reconciler.run_task(&check_path, &json!({})).await {
            Ok(finished) => finished,
            Err(e) => return compliance_failure(ctx, &check_path, e),
        };

        let classification = match classify(&response, &CLUSTER_CONFIG_PROBE, &task_id) {
            Classification::Compliant { summary } if !local_diffs.is_empty() => Classification::NonCompliant {
                summary,
                diffs: local_diffs,
            },
            Classification::NonCompliant { summary, mut diffs } => {
                diffs.extend(local_diffs);
                Classification::NonCompliant { summary, diffs }
            }
            other => other,
        };
        info!("Check-compliance task {} finished: {:?}", task_id, classification.verdict());
        if matches!(classification, Classification::NonCompliant { .. }) {
            warn!("Cluster {} on {} is not compliant", self.cluster_id, reconciler.hostname());
        }
        ComplianceResponse::from(build_drift_response(ctx.with_task_id(task_id), classification))
    }
}
