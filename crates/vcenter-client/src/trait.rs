//! VcenterClient trait for mocking
//!
//! This trait abstracts the VcenterClient to enable mocking in unit tests.
//! The concrete VcenterClient implements this trait, and tests can use mock implementations.

use crate::error::VcenterError;
use crate::task::{task_id_from_response, TASKS_PATH};
use serde_json::Value;

/// Trait for vCenter REST API operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait VcenterClientTrait: Send + Sync {
    /// Hostname of the vCenter this client talks to
    fn hostname(&self) -> &str;

    async fn get(&self, path: &str) -> Result<Value, VcenterError>;
    async fn put(&self, path: &str, body: &Value) -> Result<(), VcenterError>;
    async fn post(&self, path: &str, body: &Value) -> Result<Value, VcenterError>;
    async fn delete(&self, path: &str) -> Result<(), VcenterError>;

    /// Submit an asynchronous (`vmw-task=true`) request and return its task id
    async fn post_task(&self, path: &str, body: &Value) -> Result<String, VcenterError> {
        let response = self.post(path, body).await?;
        task_id_from_response(&response)
    }

    /// Fetch the current state of a task
    async fn get_task(&self, task_id: &str) -> Result<Value, VcenterError> {
        self.get(&format!("{}/{}", TASKS_PATH, task_id)).await
    }

    /// Release any server-side session held by the client
    async fn close(&self) -> Result<(), VcenterError> {
        Ok(())
    }
}
