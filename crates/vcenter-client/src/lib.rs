//! vCenter REST API Client
//!
//! A Rust client library for the vCenter REST API as used by the
//! configuration controllers: session authentication, plain
//! `get`/`put`/`post`/`delete` calls on JSON documents, and submission and
//! polling of asynchronous tasks.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use vcenter_client::{wait_for_task, Context, VcenterClient, VcenterClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = Context::new("vcenter.example.com", "administrator@vsphere.local", "secret");
//! let client = VcenterClient::connect(&ctx).await?;
//!
//! // Read a setting
//! let ntp = client.get("/api/appliance/ntp").await?;
//!
//! // Run a task and wait for it
//! let task_id = client
//!     .post_task("/api/esx/settings/clusters/domain-c8/configuration?action=check-compliance&vmw-task=true", &serde_json::json!({}))
//!     .await?;
//! let task = wait_for_task(&client, &task_id, Duration::from_secs(5), Duration::from_secs(600)).await?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod common;
pub mod context;
pub mod error;
pub mod task;
#[path = "trait.rs"]
pub mod vcenter_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{VcenterClient, SESSION_PATH};
pub use common::{build_query_string, HttpClient};
pub use context::Context;
pub use error::VcenterError;
pub use task::{task_id_from_response, wait_for_task, TASKS_PATH, TASK_FAILED, TASK_SUCCEEDED};
pub use vcenter_trait::VcenterClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::{MockVcenterClient, RecordedRequest};
