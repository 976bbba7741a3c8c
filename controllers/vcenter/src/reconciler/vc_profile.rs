//! VC profile controller
//!
//! Manages the vCenter configuration profile through the desired-state
//! API. Compliance is computed by vCenter: the desired components are
//! merged onto the live profile and submitted to a `scan-desired-state`
//! task, whose result carries per-component diffs.

use super::{compliance_failure, require_mapping, set_outcome, ConfigController, Reconciler};
use crate::compliance::{build_drift_response, classify, Classification, VC_PROFILE_PROBE};
use crate::document::{merge, project};
use crate::error::ControllerError;
use drift_spec::{ComplianceResponse, GetResponse, SetResponse};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use vcenter_client::build_query_string;

/// Profile components managed by this controller
pub const VC_PROFILE_COMPONENTS: [&str; 5] = [
    "appliance",
    "authmgmt",
    "inventory",
    "inventoryauthorization",
    "vsphereuiconfiguration",
];

const CONFIG_PATH: &str = "/api/appliance/vcenter/settings/v1/config";

pub struct VcProfileController;

impl VcProfileController {
    fn scan_path() -> String {
        format!("{}?action=scan-desired-state&vmw-task=true", CONFIG_PATH)
    }

    fn apply_path() -> String {
        format!("{}?action=apply-desired-state&vmw-task=true", CONFIG_PATH)
    }

    /// Top-level components of `desired`, all of which must be supported
    fn requested_components(desired: &Value) -> Result<Vec<String>, ControllerError> {
        let components = require_mapping(desired, "VC profile")?;
        for component in components.keys() {
            if !VC_PROFILE_COMPONENTS.contains(&component.as_str()) {
                return Err(ControllerError::UnsupportedComponent(format!(
                    "{} (supported: {})",
                    component,
                    VC_PROFILE_COMPONENTS.join(", ")
                )));
            }
        }
        Ok(components.keys().cloned().collect())
    }

    async fn current_profile(reconciler: &Reconciler, components: &[String]) -> Result<Value, ControllerError> {
        let params: Vec<(&str, &str)> = components.iter().map(|c| ("components", c.as_str())).collect();
        let path = format!("{}?{}", CONFIG_PATH, build_query_string(&params));
        debug!("Reading VC profile components {:?}", components);
        Ok(reconciler.client.get(&path).await?)
    }

    /// Live profile with `desired` merged on top
    async fn desired_state(reconciler: &Reconciler, desired: &Value) -> Result<Value, ControllerError> {
        let components = Self::requested_components(desired)?;
        let current = Self::current_profile(reconciler, &components).await?;
        Ok(merge(current, desired.clone()))
    }

    async fn submit(reconciler: &Reconciler, path: &str, desired: &Value) -> Result<(String, Value), ControllerError> {
        let desired_state = Self::desired_state(reconciler, desired).await?;
        reconciler.run_task(path, &json!({ "desired_state": desired_state })).await
    }
}

#[async_trait::async_trait]
impl ConfigController for VcProfileController {
    fn name(&self) -> &'static str {
        "vc_profile"
    }

    fn description(&self) -> &'static str {
        "vCenter configuration profile compliance"
    }

    async fn get(&self, reconciler: &Reconciler, template: Option<&Value>) -> GetResponse {
        let components = match template {
            Some(template) => match Self::requested_components(template) {
                Ok(components) => components,
                Err(e) => return GetResponse::failed(e.to_string()),
            },
            None => VC_PROFILE_COMPONENTS.iter().map(|c| c.to_string()).collect(),
        };

        match Self::current_profile(reconciler, &components).await {
            Ok(current) => GetResponse::ok(match template {
                Some(template) => project(&current, template),
                None => current,
            }),
            Err(e) => GetResponse::failed(e.to_string()),
        }
    }

    async fn set(&self, reconciler: &Reconciler, desired: &Value) -> SetResponse {
        match Self::submit(reconciler, &Self::apply_path(), desired).await {
            Ok((task_id, response)) => {
                info!("Apply task {} finished for {}", task_id, reconciler.hostname());
                set_outcome(&response, &VC_PROFILE_PROBE, &task_id)
            }
            Err(e) => SetResponse::failed(vec![e.to_string()]),
        }
    }

    async fn check_compliance(&self, reconciler: &Reconciler, desired: &Value) -> ComplianceResponse {
        let ctx = self.drift_context(reconciler);
        let (task_id, response) = match Self::submit(reconciler, &Self::scan_path(), desired).await {
            Ok(finished) => finished,
            Err(e) => return compliance_failure(ctx, CONFIG_PATH, e),
        };

        let classification = classify(&response, &VC_PROFILE_PROBE, &task_id);
        info!("Scan task {} finished: {:?}", task_id, classification.verdict());
        if let Classification::NonCompliant { diffs, .. } = &classification {
            warn!("VC profile drift detected on {}: {} differences", reconciler.hostname(), diffs.len());
        }
        ComplianceResponse::from(build_drift_response(ctx.with_task_id(task_id), classification))
    }
}
