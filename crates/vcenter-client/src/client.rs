//! vCenter API client
//!
//! Implements the vCenter REST API client on top of a session-authenticated
//! HTTP wrapper. Sessions are opened with `POST /api/session`.

use crate::common::{read_json, HttpClient};
use crate::context::Context;
use crate::error::VcenterError;
use crate::vcenter_trait::VcenterClientTrait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// Session create/delete endpoint
pub const SESSION_PATH: &str = "/api/session";

/// vCenter API client
pub struct VcenterClient {
    http: HttpClient,
    hostname: String,
}

impl VcenterClient {
    /// Open a session against the vCenter described by `ctx`
    ///
    /// # Returns
    /// * `Ok(VcenterClient)` - Session established
    /// * `Err(VcenterError)` - Credentials rejected or vCenter unreachable
    pub async fn connect(ctx: &Context) -> Result<Self, VcenterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .danger_accept_invalid_certs(!ctx.verify_ssl)
            .build()?;

        let base_url = ctx.base_url();
        debug!("Creating vCenter session on {}", base_url);

        let response = client
            .post(format!("{}{}", base_url, SESSION_PATH))
            .basic_auth(&ctx.username, Some(&ctx.password))
            .header("Accept", "application/json")
            .send()
            .await?;

        let session_id = match read_json("POST", SESSION_PATH, response).await? {
            Value::String(id) => id,
            other => {
                return Err(VcenterError::Authentication(format!(
                    "unexpected session response: {}",
                    other
                )));
            }
        };

        info!("Session established with {}", ctx.hostname);
        Ok(Self {
            http: HttpClient::new(client, base_url, session_id),
            hostname: ctx.hostname.clone(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Close the session
    pub async fn disconnect(&self) -> Result<(), VcenterError> {
        self.http.delete(SESSION_PATH).await
    }
}

#[async_trait::async_trait]
impl VcenterClientTrait for VcenterClient {
    fn hostname(&self) -> &str {
        &self.hostname
    }

    async fn get(&self, path: &str) -> Result<Value, VcenterError> {
        self.http.get(path).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<(), VcenterError> {
        self.http.put(path, body).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, VcenterError> {
        self.http.post(path, body).await
    }

    async fn delete(&self, path: &str) -> Result<(), VcenterError> {
        self.http.delete(path).await
    }

    async fn close(&self) -> Result<(), VcenterError> {
        self.disconnect().await
    }
}
