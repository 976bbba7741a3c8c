//! Mock VcenterClient for unit testing
//!
//! This module provides a mock implementation of VcenterClientTrait that can be used
//! in unit tests without requiring a running vCenter.

use crate::error::VcenterError;
use crate::task::TASKS_PATH;
use crate::vcenter_trait::VcenterClientTrait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A request observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

/// Mock VcenterClient for testing
///
/// GET responses, POST responses and task progressions are configured up
/// front; every call is recorded so tests can assert on what was sent.
#[derive(Clone, Default)]
pub struct MockVcenterClient {
    hostname: String,
    // Canned GET responses by path
    documents: Arc<Mutex<HashMap<String, Value>>>,
    // Canned POST responses by path
    post_responses: Arc<Mutex<HashMap<String, Value>>>,
    // Successive task states by task id; the last state repeats
    tasks: Arc<Mutex<HashMap<String, VecDeque<Value>>>>,
    // Paths that fail with an API error
    failures: Arc<Mutex<HashMap<String, String>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockVcenterClient {
    /// Create a new mock client
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            ..Default::default()
        }
    }

    /// Serve `document` for GET requests on `path` (for test setup)
    pub fn set_document(&self, path: impl Into<String>, document: Value) {
        lock(&self.documents).insert(path.into(), document);
    }

    /// Answer POST requests on `path` with `response` (for test setup)
    pub fn set_post_response(&self, path: impl Into<String>, response: Value) {
        lock(&self.post_responses).insert(path.into(), response);
    }

    /// Queue the states a task goes through; the last one is returned on every later poll
    pub fn set_task_states(&self, task_id: impl Into<String>, states: Vec<Value>) {
        lock(&self.tasks).insert(task_id.into(), states.into());
    }

    /// Make every call on `path` fail with an API error (for test setup)
    pub fn fail_path(&self, path: impl Into<String>, message: impl Into<String>) {
        lock(&self.failures).insert(path.into(), message.into());
    }

    /// All requests seen so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Requests seen so far with the given method
    pub fn requests_with_method(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests().into_iter().filter(|r| r.method == method).collect()
    }

    fn record(&self, method: &'static str, path: &str, body: Option<&Value>) -> Result<(), VcenterError> {
        lock(&self.requests).push(RecordedRequest {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });
        match lock(&self.failures).get(path) {
            Some(message) => Err(VcenterError::Api(format!("{} {} failed: {}", method, path, message))),
            None => Ok(()),
        }
    }

    fn next_task_state(&self, task_id: &str) -> Result<Value, VcenterError> {
        let mut tasks = lock(&self.tasks);
        let states = tasks
            .get_mut(task_id)
            .ok_or_else(|| VcenterError::NotFound(format!("Task {} not found", task_id)))?;
        let state = if states.len() > 1 { states.pop_front() } else { states.front().cloned() };
        state.ok_or_else(|| VcenterError::NotFound(format!("Task {} has no states", task_id)))
    }
}

#[async_trait::async_trait]
impl VcenterClientTrait for MockVcenterClient {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    async fn get(&self, path: &str) -> Result<Value, VcenterError> {
        self.record("GET", path, None)?;
        if let Some(task_id) = path.strip_prefix(TASKS_PATH).and_then(|rest| rest.strip_prefix('/')) {
            return self.next_task_state(task_id);
        }
        lock(&self.documents)
            .get(path)
            .cloned()
            .ok_or_else(|| VcenterError::NotFound(format!("Resource not found: {}", path)))
    }

    async fn put(&self, path: &str, body: &Value) -> Result<(), VcenterError> {
        self.record("PUT", path, Some(body))
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, VcenterError> {
        self.record("POST", path, Some(body))?;
        Ok(lock(&self.post_responses).get(path).cloned().unwrap_or(Value::Null))
    }

    async fn delete(&self, path: &str) -> Result<(), VcenterError> {
        self.record("DELETE", path, None)
    }
}
