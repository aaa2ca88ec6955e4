use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::Backend;

/// An HTTP response as received, before any validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
}

/// One GET against the leaderboard service. Non-2xx statuses are not errors
/// here; only transport failures are.
pub trait LeaderboardFetcher {
    fn fetch(&self, url: &str) -> impl std::future::Future<Output = Result<RawResponse>> + Send;
}

impl<T> LeaderboardFetcher for Arc<T>
where
    T: LeaderboardFetcher + Send + Sync,
{
    async fn fetch(&self, url: &str) -> Result<RawResponse> {
        self.as_ref().fetch(url).await
    }
}

pub struct LeaderboardClient {
    client: reqwest::Client,
    tunnel_bypass_header: Option<String>,
}

impl LeaderboardClient {
    pub fn new(tunnel_bypass_header: Option<&str>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("failed to build HTTP client")?;

        Ok(Self {
            client,
            tunnel_bypass_header: tunnel_bypass_header
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(str::to_string),
        })
    }

    pub fn from_config(backend: &Backend) -> Result<Self> {
        Self::new(
            backend.tunnel_bypass_header.as_deref(),
            backend.request_timeout_secs.map(Duration::from_secs),
        )
    }
}

impl LeaderboardFetcher for LeaderboardClient {
    async fn fetch(&self, url: &str) -> Result<RawResponse> {
        debug!(url = %url, "fetching leaderboard");

        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(name) = &self.tunnel_bypass_header {
            request = request.header(name.as_str(), "true");
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("GET {url} failed"))?;

        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .text()
            .await
            .with_context(|| format!("failed to read response body from {url}"))?;

        debug!(url = %url, status, bytes = body.len(), "leaderboard response received");
        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}
