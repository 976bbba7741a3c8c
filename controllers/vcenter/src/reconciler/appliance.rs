//! Appliance setting controllers
//!
//! DNS, NTP, syslog forwarding and backup schedules are plain REST
//! resources on the vCenter appliance. There is no compliance task for
//! them, so drift is computed locally: the live document is projected onto
//! the desired document's shape and the two are diffed.

use super::{compliance_failure, ConfigController, Reconciler};
use crate::compliance::{build_drift_response, Classification, TaskSummary};
use crate::document::{diff_documents, merge, project};
use crate::error::ControllerError;
use drift_spec::{ComplianceResponse, GetResponse, SetResponse};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};
use vcenter_client::VcenterError;

/// How a setting is written back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetStyle {
    /// One PUT of the whole document, wrapped under the given key
    Wrapped(&'static str),
    /// A mapping of id to item; each item is PUT to `{path}/{id}` when it
    /// exists and POSTed there otherwise
    PerItem,
}

/// An appliance setting managed through a single REST resource
#[derive(Debug)]
pub struct ApplianceSetting {
    pub name: &'static str,
    pub description: &'static str,
    pub path: &'static str,
    pub set_style: SetStyle,
}

pub static DNS: ApplianceSetting = ApplianceSetting {
    name: "dns",
    description: "Appliance DNS servers",
    path: "/api/appliance/networking/dns/servers",
    set_style: SetStyle::Wrapped("config"),
};

pub static NTP: ApplianceSetting = ApplianceSetting {
    name: "ntp",
    description: "Appliance NTP servers",
    path: "/api/appliance/ntp",
    set_style: SetStyle::Wrapped("servers"),
};

pub static SYSLOG: ApplianceSetting = ApplianceSetting {
    name: "syslog",
    description: "Appliance syslog forwarding",
    path: "/api/appliance/logging/forwarding",
    set_style: SetStyle::Wrapped("cfg_list"),
};

pub static BACKUP_SCHEDULE: ApplianceSetting = ApplianceSetting {
    name: "backup_schedule",
    description: "Appliance backup schedules",
    path: "/api/appliance/recovery/backup/schedules",
    set_style: SetStyle::PerItem,
};

/// Controller for one appliance setting
pub struct ApplianceController {
    setting: &'static ApplianceSetting,
}

impl ApplianceController {
    pub fn new(setting: &'static ApplianceSetting) -> Self {
        Self { setting }
    }

    async fn current(&self, reconciler: &Reconciler) -> Result<Value, ControllerError> {
        debug!("Reading {} from {}", self.setting.name, self.setting.path);
        Ok(reconciler.client.get(self.setting.path).await?)
    }

    /// `{name: value}`, so that list-valued settings project and diff like mappings
    fn wrap(&self, value: Value) -> Value {
        let mut wrapped = Map::new();
        wrapped.insert(self.setting.name.to_string(), value);
        Value::Object(wrapped)
    }

    /// Reject empty or misshapen desired values before anything is read
    fn validate(&self, desired: &Value) -> Result<(), ControllerError> {
        let empty = match desired {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::String(text) => text.is_empty(),
            _ => false,
        };
        if empty {
            return Err(ControllerError::Validation(format!("desired {} is empty", self.setting.name)));
        }
        if self.setting.set_style == SetStyle::PerItem && !desired.is_object() {
            return Err(ControllerError::Validation(format!(
                "desired {} must be a mapping of id to item",
                self.setting.name
            )));
        }
        Ok(())
    }

    async fn apply(&self, reconciler: &Reconciler, desired: &Value) -> Result<(), ControllerError> {
        self.validate(desired)?;
        let current = self.current(reconciler).await?;

        match self.setting.set_style {
            SetStyle::Wrapped(key) => {
                let merged = merge(current, desired.clone());
                reconciler.client.put(self.setting.path, &json!({ key: merged })).await?;
                info!("Updated {} on {}", self.setting.name, reconciler.hostname());
                Ok(())
            }
            SetStyle::PerItem => self.apply_items(reconciler, &current, desired).await,
        }
    }

    async fn apply_items(&self, reconciler: &Reconciler, current: &Value, desired: &Value) -> Result<(), ControllerError> {
        let Some(items) = desired.as_object() else {
            return Ok(());
        };
        let mut failures = Vec::new();
        for (id, item) in items {
            let path = format!("{}/{}", self.setting.path, id);
            let result = match current.get(id) {
                Some(existing) => reconciler.client.put(&path, &merge(existing.clone(), item.clone())).await,
                None => reconciler.client.post(&path, item).await.map(|_| ()),
            };
            match result {
                Ok(()) => info!("Applied {} {} on {}", self.setting.name, id, reconciler.hostname()),
                Err(e) => {
                    error!("Failed to apply {} {}: {}", self.setting.name, id, e);
                    failures.push(format!("{}: {}", id, e));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(ControllerError::Transport(VcenterError::Api(failures.join("; "))))
        }
    }
}

#[async_trait::async_trait]
impl ConfigController for ApplianceController {
    fn name(&self) -> &'static str {
        self.setting.name
    }

    fn description(&self) -> &'static str {
        self.setting.description
    }

    async fn get(&self, reconciler: &Reconciler, template: Option<&Value>) -> GetResponse {
        match self.current(reconciler).await {
            Ok(current) => GetResponse::ok(match template {
                Some(template) => project(&current, template),
                None => current,
            }),
            Err(e) => GetResponse::failed(e.to_string()),
        }
    }

    async fn set(&self, reconciler: &Reconciler, desired: &Value) -> SetResponse {
        match self.apply(reconciler, desired).await {
            Ok(()) => SetResponse::success(),
            Err(e) => SetResponse::failed(vec![e.to_string()]),
        }
    }

    async fn check_compliance(&self, reconciler: &Reconciler, desired: &Value) -> ComplianceResponse {
        let ctx = self.drift_context(reconciler);
        if let Err(e) = self.validate(desired) {
            return compliance_failure(ctx, self.setting.path, e);
        }
        let current = match self.current(reconciler).await {
            Ok(current) => current,
            Err(e) => return compliance_failure(ctx, self.setting.path, e),
        };

        let desired = self.wrap(desired.clone());
        let projected = project(&self.wrap(current), &desired);
        let diffs = diff_documents(&projected, &desired, "", Some(self.setting.name));

        let classification = if diffs.is_empty() {
            debug!("{} on {} matches the desired value", self.setting.name, reconciler.hostname());
            Classification::Compliant {
                summary: TaskSummary::default(),
            }
        } else {
            warn!("{} drift detected on {}: {} differences", self.setting.name, reconciler.hostname(), diffs.len());
            Classification::NonCompliant {
                summary: TaskSummary::default(),
                diffs,
            }
        };
        ComplianceResponse::from(build_drift_response(ctx, classification))
    }
}
