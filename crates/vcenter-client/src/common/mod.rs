//! Common utilities for the vCenter API client
//!
//! Provides the authenticated HTTP wrapper shared by all API calls.

use crate::error::VcenterError;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tracing::debug;

/// Header carrying the vCenter session token
pub const SESSION_HEADER: &str = "vmware-api-session-id";

/// HTTP client wrapper with session authentication
pub struct HttpClient {
    client: Client,
    base_url: String,
    session_id: String,
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String, session_id: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session_id,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(SESSION_HEADER, &self.session_id)
            .header("Accept", "application/json")
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Value, VcenterError> {
        let url = self.build_url(path);
        debug!("GET {}", url);

        let response = self.authorize(self.client.get(&url)).send().await?;
        read_json("GET", path, response).await
    }

    /// Make a PUT request
    pub async fn put(&self, path: &str, body: &Value) -> Result<(), VcenterError> {
        let url = self.build_url(path);
        debug!("PUT {} with body: {}", url, serde_json::to_string_pretty(body).unwrap_or_default());

        let response = self.authorize(self.client.put(&url)).json(body).send().await?;
        read_json("PUT", path, response).await.map(|_| ())
    }

    /// Make a POST request
    pub async fn post(&self, path: &str, body: &Value) -> Result<Value, VcenterError> {
        let url = self.build_url(path);
        debug!("POST {} with body: {}", url, serde_json::to_string_pretty(body).unwrap_or_default());

        let response = self.authorize(self.client.post(&url)).json(body).send().await?;
        read_json("POST", path, response).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), VcenterError> {
        let url = self.build_url(path);
        debug!("DELETE {}", url);

        let response = self.authorize(self.client.delete(&url)).send().await?;
        read_json("DELETE", path, response).await.map(|_| ())
    }
}

/// Check the status of a response and decode its body
///
/// An empty body (e.g., 204 No Content) decodes to `Value::Null`.
pub(crate) async fn read_json(method: &str, path: &str, response: Response) -> Result<Value, VcenterError> {
    let status = response.status();
    if status == 404 {
        let body = response.text().await.unwrap_or_default();
        return Err(VcenterError::NotFound(format!(
            "Resource not found: {} - {}",
            path, body
        )));
    }

    if status == 401 || status == 403 {
        let body = response.text().await.unwrap_or_default();
        return Err(VcenterError::Authentication(format!(
            "{} {} rejected: {} - {}",
            method, path, status, body
        )));
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(VcenterError::Api(format!(
            "{} {} failed: {} - {}",
            method, path, status, body
        )));
    }

    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| {
        VcenterError::InvalidResponse(format!(
            "error decoding {} {} response: {} - Response (first 500 chars): {}",
            method,
            path,
            e,
            text.chars().take(500).collect::<String>()
        ))
    })
}

/// Build query string from parameters
///
/// Repeated keys are kept, which is how vCenter expects set-valued filters.
pub fn build_query_string(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
