//! Controller configuration
//!
//! Read once at startup from environment variables.

use crate::controller::{ControllerKind, Operation};
use crate::error::ControllerError;
use std::path::PathBuf;
use std::time::Duration;
use vcenter_client::Context;

const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_TASK_TIMEOUT_SECS: u64 = 600;

/// Everything the binary needs to run one controller operation
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub context: Context,
    pub poll_interval: Duration,
    pub task_timeout: Duration,
    pub controller: ControllerKind,
    pub operation: Operation,
    /// Desired spec (or template, for `get`)
    pub desired_spec_path: Option<PathBuf>,
    pub cluster_id: Option<String>,
}

impl ControllerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let optional = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |key: &str| {
            optional(key).ok_or_else(|| {
                ControllerError::InvalidConfig(format!("{} environment variable is required", key))
            })
        };

        let mut context = Context::new(
            required("VCENTER_HOSTNAME")?,
            required("VCENTER_USERNAME")?,
            required("VCENTER_PASSWORD")?,
        );
        if let Some(value) = optional("VCENTER_VERIFY_SSL") {
            context.verify_ssl = parse_bool("VCENTER_VERIFY_SSL", &value)?;
        }

        let poll_interval = parse_secs("TASK_POLL_INTERVAL_SECS", optional("TASK_POLL_INTERVAL_SECS"), DEFAULT_POLL_INTERVAL_SECS)?;
        let task_timeout = parse_secs("TASK_TIMEOUT_SECS", optional("TASK_TIMEOUT_SECS"), DEFAULT_TASK_TIMEOUT_SECS)?;

        let controller: ControllerKind = required("CONTROLLER")?.parse()?;
        let operation: Operation = required("OPERATION")?.parse()?;

        let desired_spec_path = optional("DESIRED_SPEC_PATH").map(PathBuf::from);
        if operation.requires_desired() && desired_spec_path.is_none() {
            return Err(ControllerError::InvalidConfig(format!(
                "DESIRED_SPEC_PATH environment variable is required for {}",
                operation
            )));
        }

        let cluster_id = optional("CLUSTER_ID");
        if controller == ControllerKind::ClusterConfig && cluster_id.is_none() {
            return Err(ControllerError::InvalidConfig(
                "CLUSTER_ID environment variable is required for cluster_config".to_string(),
            ));
        }

        Ok(Self {
            context,
            poll_interval,
            task_timeout,
            controller,
            operation,
            desired_spec_path,
            cluster_id,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ControllerError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ControllerError::InvalidConfig(format!("{} must be true or false, got {}", key, value))),
    }
}

fn parse_secs(key: &str, value: Option<String>, default: u64) -> Result<Duration, ControllerError> {
    let secs = match value {
        Some(value) => value
            .parse::<u64>()
            .map_err(|_| ControllerError::InvalidConfig(format!("{} must be a number of seconds, got {}", key, value)))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}
