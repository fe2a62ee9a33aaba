//! Application State

use std::sync::Arc;

use quant_core::TurnEngine;
use quant_trading::BalanceOracle;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Turn engine wired with the model gateway and action catalogue
    pub engine: Arc<TurnEngine>,

    /// Balance oracle for the wallet-balance endpoint
    pub oracle: Arc<dyn BalanceOracle>,
}
