//! Asynchronous task polling
//!
//! vCenter long-running operations return a task id; the task is then
//! polled at a fixed interval until it reaches a terminal status.

use crate::error::VcenterError;
use crate::vcenter_trait::VcenterClientTrait;
use serde_json::Value;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Task status endpoint
pub const TASKS_PATH: &str = "/api/cis/tasks";

/// Terminal task statuses
pub const TASK_SUCCEEDED: &str = "SUCCEEDED";
pub const TASK_FAILED: &str = "FAILED";

const IN_PROGRESS: [&str; 3] = ["PENDING", "RUNNING", "BLOCKED"];

/// Extract a task id from a task submission response
///
/// Accepts a bare JSON string or `{"value": "<id>"}`.
pub fn task_id_from_response(response: &Value) -> Result<String, VcenterError> {
    response
        .as_str()
        .or_else(|| response.get("value").and_then(Value::as_str))
        .map(str::to_string)
        .ok_or_else(|| VcenterError::InvalidResponse(format!("expected a task id, got {}", response)))
}

/// Poll a task until it succeeds or fails
///
/// Returns the terminal task response. Transport errors are returned
/// immediately; a task still running once `timeout` has elapsed yields
/// `VcenterError::TaskTimeout`.
pub async fn wait_for_task<C>(
    client: &C,
    task_id: &str,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<Value, VcenterError>
where
    C: VcenterClientTrait + ?Sized,
{
    let started = Instant::now();
    loop {
        let response = client.get_task(task_id).await?;
        let status = response
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| VcenterError::InvalidResponse(format!("task {} response has no status: {}", task_id, response)))?;

        if status == TASK_SUCCEEDED || status == TASK_FAILED {
            info!("Task {} finished with status {}", task_id, status);
            return Ok(response);
        }

        if !IN_PROGRESS.contains(&status) {
            return Err(VcenterError::TaskStatus {
                task_id: task_id.to_string(),
                status: status.to_string(),
            });
        }

        if started.elapsed() >= timeout {
            return Err(VcenterError::TaskTimeout {
                task_id: task_id.to_string(),
                timeout,
            });
        }

        debug!("Task {} is {}, polling again in {:?}", task_id, status, poll_interval);
        sleep(poll_interval).await;
    }
}
