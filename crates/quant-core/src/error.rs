//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
#[derive(Error, Debug)]
pub enum AgentError {
    /// Missing or invalid configuration (e.g. no provider API key)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Client supplied a history the engine cannot work with
    #[error("Malformed client input: {0}")]
    MalformedInput(String),

    /// LLM provider returned an error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider unreachable or not responding
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Authentication with the provider failed
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Provider rate limit hit
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Model requested a function the catalogue does not declare.
    /// Indicates catalogue/dispatcher drift and is fatal for the turn.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Required arguments missing or not coercible to their declared type
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A backend action failed while executing
    #[error("Action failed: {0}")]
    ActionFailed(String),

    /// Remote trading backend or balance oracle error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Other/unknown error
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Check if the error is safe to retry. Only idempotent reads may be
    /// retried; `startStrategy` moves funds and must never reach this path.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::ProviderUnavailable(_)
                | AgentError::RateLimited(_)
                | AgentError::Io(_)
        )
    }

    /// Convert to a user-facing message. Fatal turns return exactly one
    /// of these; no partial results.
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Config(msg) => format!("The agent is not configured correctly: {}", msg),
            AgentError::MalformedInput(msg) => format!("Invalid request: {}", msg),
            AgentError::Provider(msg) => format!("The AI service encountered an error: {}", msg),
            AgentError::ProviderUnavailable(_) => {
                "The AI service is currently unavailable. Please try again.".into()
            }
            AgentError::RateLimited(_) => {
                "You've made too many requests. Please wait a moment.".into()
            }
            AgentError::Auth(_) => "Authentication failed. Please check your credentials.".into(),
            AgentError::UnknownFunction(name) => {
                format!("The function '{}' is not available.", name)
            }
            AgentError::InvalidArguments(msg) => format!("Invalid function arguments: {}", msg),
            AgentError::ActionFailed(msg) => format!("Action error: {}", msg),
            AgentError::Backend(_) => {
                "The trading backend is currently unavailable. Please try again.".into()
            }
            _ => "An unexpected error occurred.".into(),
        }
    }
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Other(err.to_string())
    }
}
