//! Trading Backend Adapter
//!
//! Submits a strategy run to the remote trading service. This call moves
//! funds: it is never retried, and a transport failure fails the whole
//! turn rather than risking a duplicate submission.

use std::time::Duration;

use async_trait::async_trait;

use quant_core::{AgentError, Result};

use crate::model::{RunStrategyRequest, RunStrategyResponse};

/// Trading backend seam (implement per backend, or as a test double)
#[async_trait]
pub trait TradeExecutor: Send + Sync {
    /// Submit a strategy run. Side-effecting; callers must not retry.
    async fn run_strategy(&self, request: &RunStrategyRequest) -> Result<RunStrategyResponse>;
}

/// HTTP adapter for the remote trading service
pub struct HttpTradeExecutor {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTradeExecutor {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Create from `TRADING_BACKEND_URL`
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var("TRADING_BACKEND_URL")
            .map_err(|_| AgentError::Config("TRADING_BACKEND_URL is not set".into()))?;
        Self::new(base_url)
    }
}

#[async_trait]
impl TradeExecutor for HttpTradeExecutor {
    async fn run_strategy(&self, request: &RunStrategyRequest) -> Result<RunStrategyResponse> {
        let url = format!("{}/run-strategy", self.base_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| AgentError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AgentError::Backend(format!(
                "trading backend returned {status}: {detail}"
            )));
        }

        response
            .json::<RunStrategyResponse>()
            .await
            .map_err(|e| AgentError::Backend(format!("undecodable backend response: {e}")))
    }
}
