//! HTTP client for the ArcVault strategy backend.

use std::time::Duration;

use anyhow::Context;
use reqwest::Client;
use tracing::{debug, instrument};

use arcvault_core::config::BackendConfig;
use arcvault_core::dashboard::ActionBody;
use arcvault_core::descriptor::StrategyDescriptor;
use arcvault_core::result::ActionResult;

use crate::protocol::RunRequest;

/// Client for the strategy API. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Build a client whose every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &BackendConfig) -> anyhow::Result<Self> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the strategy list.
    #[instrument(skip(self))]
    pub async fn list_strategies(&self) -> anyhow::Result<Vec<StrategyDescriptor>> {
        let url = format!("{}/api/strategies", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let strategies: Vec<StrategyDescriptor> = resp.error_for_status()?.json().await?;
        debug!("Fetched {} strategies", strategies.len());
        Ok(strategies)
    }

    /// Run one action of a strategy.
    #[instrument(skip(self, body), fields(action = %body.action))]
    pub async fn run_action(
        &self,
        strategy_id: &str,
        body: &ActionBody,
    ) -> anyhow::Result<ActionResult> {
        let url = format!("{}/api/run/{}", self.base_url, strategy_id);
        let req = RunRequest::from(body);
        let resp = self.client.post(&url).json(&req).send().await?;
        let result: ActionResult = resp.error_for_status()?.json().await?;
        debug!(status = ?result.status, "Action returned");
        Ok(result)
    }
}
