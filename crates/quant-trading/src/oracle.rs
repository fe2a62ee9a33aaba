//! Balance Oracle
//!
//! Reads an on-chain USDC balance for a wallet address via Sui JSON-RPC.
//! This is an idempotent read, so unlike the trade executor it is retried
//! with bounded backoff before the turn is failed.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use quant_core::{AgentError, Result};

/// Coin type of the USDC denomination this oracle reports
const USDC_COIN_TYPE: &str =
    "0xa1ec7fc00a6f40db9693ad1415d0c193ad3906494428cf252621037bd7117e29::usdc::USDC";

const USDC_DECIMALS: u32 = 6;

const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 200;

/// Balance oracle seam
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    /// USDC balance for `address`, in whole tokens
    async fn usdc_balance(&self, address: &str) -> Result<f64>;
}

/// Sui fullnode JSON-RPC oracle
pub struct SuiBalanceOracle {
    client: reqwest::Client,
    rpc_url: String,
}

impl SuiBalanceOracle {
    pub fn new(rpc_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
        })
    }

    /// Create from `SUI_RPC_URL`, defaulting to the testnet fullnode
    pub fn from_env() -> Result<Self> {
        let rpc_url = std::env::var("SUI_RPC_URL")
            .unwrap_or_else(|_| "https://fullnode.testnet.sui.io:443".into());
        Self::new(rpc_url)
    }

    async fn fetch(&self, address: &str) -> Result<f64> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "suix_getAllBalances",
            "params": [address],
        });

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::Backend(format!("Sui RPC returned {status}")));
        }

        let envelope: Value = response
            .json()
            .await
            .map_err(|e| AgentError::Backend(format!("undecodable RPC response: {e}")))?;

        if let Some(error) = envelope.get("error") {
            return Err(AgentError::Backend(format!("Sui RPC error: {error}")));
        }

        decode_usdc_balance(envelope.get("result").unwrap_or(&Value::Null))
    }
}

#[async_trait]
impl BalanceOracle for SuiBalanceOracle {
    async fn usdc_balance(&self, address: &str) -> Result<f64> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.fetch(address).await {
                Ok(balance) => return Ok(balance),
                Err(err) if attempt < MAX_ATTEMPTS => {
                    let delay = BASE_BACKOFF_MS << (attempt - 1);
                    tracing::warn!(%err, attempt, delay_ms = delay, "balance lookup failed; retrying");
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Extract the USDC balance from a `suix_getAllBalances` result.
/// An address holding no USDC reports zero, not an error.
fn decode_usdc_balance(result: &Value) -> Result<f64> {
    let balances = result
        .as_array()
        .ok_or_else(|| AgentError::Backend("balance result is not an array".into()))?;

    for entry in balances {
        if entry.get("coinType").and_then(Value::as_str) == Some(USDC_COIN_TYPE) {
            let raw = entry
                .get("totalBalance")
                .and_then(Value::as_str)
                .ok_or_else(|| AgentError::Backend("totalBalance missing".into()))?;
            let units: u128 = raw
                .parse()
                .map_err(|_| AgentError::Backend(format!("unparsable balance \"{raw}\"")))?;
            #[allow(clippy::cast_precision_loss)]
            return Ok(units as f64 / 10f64.powi(USDC_DECIMALS as i32));
        }
    }

    Ok(0.0)
}
