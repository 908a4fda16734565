//! HTTP fetch capability.
//!
//! Discovery and extraction only need `fetch(url) -> bytes`. The [`Fetch`]
//! trait is that seam; [`HttpFetcher`] is the reqwest-backed implementation
//! used by the CLI.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::CrawlerConfig;
use crate::error::{HarvestError, HarvestResult};

/// Fetches the body at a URL.
///
/// Implementations must fail with [`HarvestError::Fetch`] on transport
/// errors and on non-success statuses.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> HarvestResult<Vec<u8>>;
}

/// Plain `GET` over reqwest. No auth, no extra headers.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlerConfig) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if config.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.timeout_secs));
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> HarvestResult<Vec<u8>> {
        let fetch_err = |reason: String| HarvestError::Fetch {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        Ok(body.to_vec())
    }
}
