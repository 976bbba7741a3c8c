//! vCenter Configuration Controller
//!
//! Runs one operation of one configuration controller against a vCenter:
//! - vc_profile: vCenter configuration profile (desired-state scan and apply)
//! - cluster_config: ESXi cluster configuration
//! - dns, ntp, syslog, backup_schedule: appliance settings
//!
//! The result document is printed to stdout as JSON; logs go to stderr.

mod compliance;
mod config;
mod controller;
mod document;
mod error;
mod reconciler;
#[cfg(test)]
mod test_utils;

use anyhow::Context as _;
use config::ControllerConfig;
use serde_json::Value;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    info!("Starting vCenter Configuration Controller");

    let config = ControllerConfig::from_env().context("Failed to load controller configuration")?;

    info!("Configuration:");
    info!("  vCenter: {}", config.context.hostname);
    info!("  Controller: {}", config.controller);
    info!("  Operation: {}", config.operation);

    let desired = config
        .desired_spec_path
        .as_deref()
        .map(load_desired_spec)
        .transpose()?;

    let output = controller::run(&config, desired.as_ref())
        .await
        .with_context(|| format!("Failed to run {} {}", config.controller, config.operation))?;

    let rendered = serde_json::to_string_pretty(&output).context("Failed to serialize result")?;
    println!("{}", rendered);

    Ok(())
}

/// Read a desired spec (or template) from a YAML or JSON file
fn load_desired_spec(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read desired spec {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("Failed to parse desired spec {}", path.display()))
}
