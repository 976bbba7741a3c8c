//! Connection context
//!
//! Carries what every controller call needs to reach a vCenter: where it
//! lives and how to authenticate.

/// Connection credentials for a vCenter server
#[derive(Clone)]
pub struct Context {
    pub hostname: String,
    pub username: String,
    pub password: String,
    /// Verify the server's TLS certificate
    pub verify_ssl: bool,
}

impl Context {
    pub fn new(hostname: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            username: username.into(),
            password: password.into(),
            verify_ssl: true,
        }
    }

    /// Base URL of the vCenter REST API
    pub fn base_url(&self) -> String {
        let host = self.hostname.trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        }
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("hostname", &self.hostname)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}
