//! Server-side Policy Guard
//!
//! The policy prompt instructs the model not to call trading functions
//! while the user's wallet is disconnected, but prose adherence is not
//! guaranteed. The safety-critical subset is therefore re-validated here,
//! ahead of dispatch: wallet-connection gating runs against the structured
//! block the client embeds in every user message.
//!
//! The block format (positional, one field per line):
//!
//! ```text
//! USER WALLET STATUS: <CONNECTED | NOT CONNECTED>
//! USER WALLET ADDRESS: <0x...>        (only when connected)
//! USER USDC BALANCE: <number>         (only when connected)
//! USER SAID: <the user's utterance>
//! ```

use crate::message::{Message, Role};

const STATUS_PREFIX: &str = "USER WALLET STATUS:";
const ADDRESS_PREFIX: &str = "USER WALLET ADDRESS:";
const BALANCE_PREFIX: &str = "USER USDC BALANCE:";

/// Refusal returned when the model requests a gated action while the
/// wallet is disconnected. No backend action runs in that case.
pub const WALLET_REFUSAL: &str = "Please connect your SUI wallet first so I can help you with \
trading actions. Let me know if there's anything else I can help you with!";

/// Wallet state as declared by the client in the user-message block
#[derive(Clone, Debug, PartialEq)]
pub enum WalletContext {
    Connected {
        address: Option<String>,
        usdc_balance: Option<f64>,
    },
    NotConnected,
}

impl WalletContext {
    /// Parse wallet state from one user-message block. A missing or
    /// unrecognized status line is treated as disconnected; gating fails
    /// closed.
    pub fn parse(content: &str) -> Self {
        let mut connected = false;
        let mut address = None;
        let mut usdc_balance = None;

        for line in content.lines() {
            let line = line.trim();
            if let Some(rest) = line.strip_prefix(STATUS_PREFIX) {
                connected = rest.trim().eq_ignore_ascii_case("CONNECTED");
            } else if let Some(rest) = line.strip_prefix(ADDRESS_PREFIX) {
                let value = rest.trim();
                if !value.is_empty() {
                    address = Some(value.to_string());
                }
            } else if let Some(rest) = line.strip_prefix(BALANCE_PREFIX) {
                usdc_balance = rest.trim().parse::<f64>().ok();
            }
        }

        if connected {
            WalletContext::Connected {
                address,
                usdc_balance,
            }
        } else {
            WalletContext::NotConnected
        }
    }

    /// Parse from the most recent user message in a history
    pub fn from_history(history: &[Message]) -> Self {
        history
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| Self::parse(&m.content))
            .unwrap_or(WalletContext::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, WalletContext::Connected { .. })
    }
}
