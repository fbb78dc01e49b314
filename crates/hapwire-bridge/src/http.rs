//! HTTP transport seam for action dispatch.
//!
//! The dispatcher talks to a [`HttpTransport`] trait object: one call in,
//! status and body out. The production implementation wraps a shared
//! `reqwest` client; tests substitute a recording mock.

use async_trait::async_trait;
use hapwire_core::{network_err, Error, Result};
use std::time::Duration;
use tracing::debug;

/// Basic-auth credentials for an accessory's endpoints.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    /// Send credentials preemptively; when false, credentials are only
    /// sent in a single retry after a 401 challenge.
    pub send_immediately: bool,
}

/// Response from a single HTTP exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One HTTP call, no retries, no redirect policy of its own.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn request(
        &self,
        method: &str,
        url: &str,
        body: &str,
        auth: Option<&AuthConfig>,
    ) -> Result<HttpResponse>;
}

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// `reqwest`-backed transport with a shared client.
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport with the default timeout.
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a transport with a custom per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .unwrap_or_default();
        Self { client, timeout }
    }

    fn build_request(
        &self,
        method: &reqwest::Method,
        url: &str,
        body: &str,
        credentials: Option<&AuthConfig>,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .request(method.clone(), url)
            .timeout(self.timeout);
        if !body.is_empty() {
            request = request.body(body.to_string());
        }
        if let Some(auth) = credentials {
            request = request.basic_auth(&auth.username, Some(&auth.password));
        }
        request
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<HttpResponse> {
        let response = request
            .send()
            .await
            .map_err(|e| network_err!("HTTP request failed: {}", e))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| network_err!("Failed to read response body: {}", e))?;
        Ok(HttpResponse { status, body })
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(
        &self,
        method: &str,
        url: &str,
        body: &str,
        auth: Option<&AuthConfig>,
    ) -> Result<HttpResponse> {
        let method = reqwest::Method::from_bytes(method.to_uppercase().as_bytes())
            .map_err(|_| Error::config(format!("Unsupported HTTP method: {}", method)))?;

        debug!("{} {}", method, url);
        self.send(self.build_request(&method, url, body, auth)).await
    }
}
