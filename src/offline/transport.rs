use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::db::OutboxEntry;

/// Forwards a batch of outbox entries to the field backend in one call and
/// returns the ids the backend confirmed. Unconfirmed ids stay pending.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn deliver(&self, batch: &[OutboxEntry]) -> Result<Vec<String>>;
}

#[derive(Serialize)]
struct SyncRequest<'a> {
    entries: &'a [OutboxEntry],
}

#[derive(Deserialize)]
struct SyncResponse {
    #[serde(default)]
    acknowledged: Vec<String>,
}

/// `POST {endpoint}/sync` with `{ "entries": [...] }`, expecting
/// `{ "acknowledged": ["<id>", ...] }` back.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    sync_url: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = endpoint.trim().trim_end_matches('/');
        if endpoint.is_empty() {
            bail!("sync endpoint is empty");
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            sync_url: format!("{endpoint}/sync"),
        })
    }

    pub fn sync_url(&self) -> &str {
        &self.sync_url
    }
}

#[async_trait]
impl SyncTransport for HttpTransport {
    async fn deliver(&self, batch: &[OutboxEntry]) -> Result<Vec<String>> {
        let response = self
            .client
            .post(&self.sync_url)
            .json(&SyncRequest { entries: batch })
            .send()
            .await
            .with_context(|| format!("sync request to {} failed", self.sync_url))?
            .error_for_status()
            .context("sync endpoint rejected the batch")?;

        let body: SyncResponse = response
            .json()
            .await
            .context("sync endpoint returned an unreadable acknowledgement")?;
        Ok(body.acknowledged)
    }
}

/// Used when no endpoint is configured: every attempt fails, so updates
/// stay queued until one is.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredTransport;

#[async_trait]
impl SyncTransport for UnconfiguredTransport {
    async fn deliver(&self, _batch: &[OutboxEntry]) -> Result<Vec<String>> {
        Err(anyhow!("no sync endpoint configured"))
    }
}
