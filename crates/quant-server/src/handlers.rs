//! HTTP Handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use quant_core::{AgentError, Message, Role, TurnReply};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// One prior message as supplied by the client UI
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub role: String,
    pub content: Value,

    /// Present on replayed tool messages; must survive the round trip so
    /// the provider can pair the result with its originating call
    #[serde(default)]
    pub tool_call_id: Option<String>,
}

impl IncomingMessage {
    fn to_message(&self) -> Result<Message, AgentError> {
        let role = match self.role.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "tool" => Role::Tool,
            other => {
                return Err(AgentError::MalformedInput(format!(
                    "unknown message role \"{other}\""
                )))
            }
        };

        // Clients may send structured content; flatten it to text the
        // same way the model will see it.
        let content = match &self.content {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };

        Ok(match role {
            Role::Tool => Message::tool(content, self.tool_call_id.clone()),
            role => Message::new(role, content),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<IncomingMessage>,
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub balance: f64,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Map an agent error to one user-visible failure. No partial results.
fn error_response(err: &AgentError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match err {
        AgentError::MalformedInput(_) | AgentError::InvalidArguments(_) => {
            (StatusCode::BAD_REQUEST, "INVALID_REQUEST")
        }
        AgentError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "NOT_CONFIGURED"),
        AgentError::UnknownFunction(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UNKNOWN_FUNCTION"),
        AgentError::ProviderUnavailable(_) | AgentError::Backend(_) => {
            (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR")
        }
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "AGENT_ERROR"),
    };

    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            code: code.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Main chat endpoint: one request is one user turn
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<TurnReply>, (StatusCode, Json<ErrorResponse>)> {
    let history: Vec<Message> = payload
        .messages
        .iter()
        .map(IncomingMessage::to_message)
        .collect::<Result<_, _>>()
        .map_err(|e| error_response(&e))?;

    let reply = state.engine.run_turn(&history).await.map_err(|e| {
        tracing::error!(error = %e, "turn failed");
        error_response(&e)
    })?;

    Ok(Json(reply))
}

/// USDC balance for a wallet address
pub async fn wallet_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, (StatusCode, Json<ErrorResponse>)> {
    let balance = state.oracle.usdc_balance(&address).await.map_err(|e| {
        tracing::error!(error = %e, %address, "balance lookup failed");
        error_response(&e)
    })?;

    Ok(Json(BalanceResponse { address, balance }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_request_shape() {
        let raw = r#"{
            "messages": [
                {"role": "user", "content": "USER WALLET STATUS: CONNECTED\nUSER SAID: hi"},
                {"role": "assistant", "content": "Hello!"}
            ]
        }"#;

        let request: ChatRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(request.messages.len(), 2);

        let first = request.messages[0].to_message().unwrap();
        assert_eq!(first.role, Role::User);
        assert!(first.content.starts_with("USER WALLET STATUS"));
    }

    #[test]
    fn test_structured_content_is_flattened() {
        let incoming = IncomingMessage {
            role: "user".into(),
            content: serde_json::json!({"text": "hi"}),
            tool_call_id: None,
        };

        let message = incoming.to_message().unwrap();
        assert_eq!(message.content, r#"{"text":"hi"}"#);
    }

    #[test]
    fn test_replayed_tool_message_keeps_call_id() {
        let raw = r#"{
            "messages": [
                {"role": "tool", "content": "{\"message\": \"started\"}", "tool_call_id": "call_1"}
            ]
        }"#;

        let request: ChatRequest = serde_json::from_str(raw).unwrap();
        let message = request.messages[0].to_message().unwrap();

        assert_eq!(message.role, Role::Tool);
        assert_eq!(message.tool_call_id.as_deref(), Some("call_1"));
    }

    #[test]
    fn test_unknown_role_rejected() {
        let incoming = IncomingMessage {
            role: "wizard".into(),
            content: Value::String("hi".into()),
            tool_call_id: None,
        };

        assert!(matches!(
            incoming.to_message().unwrap_err(),
            AgentError::MalformedInput(_)
        ));
    }

    #[test]
    fn test_error_status_mapping() {
        let (status, _) = error_response(&AgentError::MalformedInput("bad".into()));
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = error_response(&AgentError::UnknownFunction("nope".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = error_response(&AgentError::Backend("down".into()));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
