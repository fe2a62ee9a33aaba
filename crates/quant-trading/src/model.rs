//! Domain Models
//!
//! Wire and catalogue data types. `RunStrategyRequest` field names are the
//! trading backend's contract; renaming them breaks compatibility.

use serde::{Deserialize, Serialize};

/// A tradeable strategy as advertised to the user
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyDescriptor {
    /// Display name
    pub name: String,

    /// Traded symbol (e.g. "ETH")
    pub symbol: String,

    /// Minimum amount accepted by the strategy
    pub minimum_amount: f64,

    /// Back-tested historical return, in percent
    pub returns: f64,

    /// Longer description for the user
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A freshly generated keypair.
///
/// Lives only in-memory and in-transit for one response. There is no
/// persistence layer behind it: losing the private key here is
/// unrecoverable, so every path that creates one must surface it to the
/// caller in the same response.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletCredential {
    /// Public address, 0x-prefixed
    pub public_key: String,

    /// Secret key; the user is the sole custodian once returned
    pub private_key: String,
}

/// Request body for the trading backend's `POST /run-strategy`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunStrategyRequest {
    #[serde(rename = "privateKey")]
    pub private_key: String,

    #[serde(rename = "quoteSymbolQuantity")]
    pub quote_symbol_quantity: f64,

    pub take_profit: f64,

    pub stop_loss: f64,
}

/// Response body from `POST /run-strategy`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunStrategyResponse {
    pub message: String,
}

/// The static strategy catalogue. Backend-supplied in a future revision;
/// read-only from this system's perspective either way.
pub fn available_strategies() -> Vec<StrategyDescriptor> {
    vec![StrategyDescriptor {
        name: "Strategy 1 for ETH".into(),
        symbol: "ETH".into(),
        minimum_amount: 0.01,
        returns: 50.0,
        description: Some(
            "Strategy 1 is a customized short term quantitative trading strategy where the \
             signal is generated from a machine learning model designed to trade ETH futures. \
             From out-of-sample back-tests, the historical return for this model was around \
             50% from October 2024 - January 2025."
                .into(),
        ),
    }]
}
