//! SUI quant-agent HTTP Server
//!
//! Axum-based server exposing the conversational trading agent: one POST
//! per user turn plus a wallet-balance read. Configuration comes from the
//! environment; a missing provider credential fails startup with a clear
//! message rather than surfacing mid-conversation.

mod handlers;
mod state;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quant_core::{ActionRegistry, EngineConfig, TurnEngine};
use quant_runtime::OpenAiProvider;
use quant_trading::{
    register_actions, Ed25519Keygen, HttpTradeExecutor, SuiBalanceOracle, SENTIENT_PROMPT,
};

use crate::handlers::{chat_handler, health_check, wallet_balance};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Model gateway
    let provider = Arc::new(
        OpenAiProvider::from_env().context("model provider configuration")?,
    );
    tracing::info!("✓ Model provider configured");

    // External collaborators
    let executor = Arc::new(
        HttpTradeExecutor::from_env().context("trading backend configuration")?,
    );
    let oracle = Arc::new(SuiBalanceOracle::from_env().context("Sui RPC configuration")?);
    let keygen = Arc::new(Ed25519Keygen);

    // Action catalogue
    let mut actions = ActionRegistry::new();
    register_actions(&mut actions, executor, keygen);

    tracing::info!("Registered {} functions:", actions.len());
    for name in actions.names() {
        tracing::info!("  • {}", name);
    }

    // Turn engine
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let engine = Arc::new(TurnEngine::new(
        provider,
        Arc::new(actions),
        EngineConfig::new(SENTIENT_PROMPT).with_model(model),
    ));

    let state = AppState { engine, oracle };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_handler))
        .route("/api/balance/{address}", get(wallet_balance))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("🚀 quant-server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                 - Health check");
    tracing::info!("  POST /api/chat               - Send a user turn");
    tracing::info!("  GET  /api/balance/{{address}}  - USDC balance lookup");

    axum::serve(listener, app).await?;

    Ok(())
}
