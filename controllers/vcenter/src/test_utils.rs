//! Test utilities for unit testing controllers
//!
//! This module provides helpers for creating test data and setting up test scenarios.

use crate::reconciler::Reconciler;
use serde_json::{json, Value};
use std::time::Duration;
use vcenter_client::MockVcenterClient;

pub const TEST_HOSTNAME: &str = "vc.example.com";

/// Task id in the `<uuid>:<service>` form vCenter hands out
pub const TEST_TASK_ID: &str = "52d0be83-9e2e-7a4e-9e04-d1469959c159:com.vmware.appliance";

/// Helper to create a mock client and a reconciler sharing its state
///
/// Tasks are polled without delay.
pub fn create_test_reconciler() -> (MockVcenterClient, Reconciler) {
    let client = MockVcenterClient::new(TEST_HOSTNAME);
    let reconciler = Reconciler::new(client.clone(), Duration::ZERO, Duration::from_secs(60));
    (client, reconciler)
}

/// Helper to register a task: POST on `path` returns `task_id`, which then
/// runs once and finishes as `terminal`
pub fn queue_task(client: &MockVcenterClient, path: &str, task_id: &str, terminal: Value) {
    client.set_post_response(path, json!(task_id));
    client.set_task_states(task_id, vec![json!({"status": "RUNNING"}), terminal]);
}

/// Helper to create a successful task response with the given result
pub fn succeeded_task(result: Value) -> Value {
    json!({
        "status": "SUCCEEDED",
        "result": result,
        "end_time": "2024-01-01T00:05:00Z"
    })
}

/// Helper to create a failed task response
pub fn failed_task(message: &str) -> Value {
    json!({
        "status": "FAILED",
        "error": {
            "error_type": "ERROR",
            "messages": [{"id": "com.vmware.error", "default_message": message}]
        }
    })
}
