//! HTTP client for the rewrite service

use super::{RewriteError, RewriteRequest, RewriteResponse, RewriteService};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Default service location for local development
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:3001";

/// Rewrite service reached over HTTP (`POST {base_url}/revise`)
pub struct HttpRewriteService {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpRewriteService {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let endpoint = revise_endpoint(base_url)?;
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint,
            timeout: Duration::from_secs(60),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL requests are sent to
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

/// Resolve `revise` against the base URL, keeping any path prefix
fn revise_endpoint(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    let base = Url::parse(&normalized)
        .with_context(|| format!("Invalid rewrite service URL: {}", base_url))?;
    base.join("revise")
        .with_context(|| format!("Invalid rewrite service URL: {}", base_url))
}

#[async_trait]
impl RewriteService for HttpRewriteService {
    fn name(&self) -> &str {
        "http"
    }

    async fn revise(&self, request: &RewriteRequest) -> Result<RewriteResponse, RewriteError> {
        tracing::debug!(
            "POST {} ({} chars, refinement: {})",
            self.endpoint,
            request.text.len(),
            request.thread_id.is_some()
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(RewriteError::from_network_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(RewriteError::from_network_error)?;

        if !status.is_success() {
            tracing::debug!("Rewrite service returned {}: {}", status, body);
            return Err(RewriteError::from_http_status(status, body));
        }

        RewriteResponse::from_json(&body)
    }
}
