//! Model Gateway
//!
//! A single request/response exchange with a language model. Implementations
//! make exactly one outbound call per `converse` invocation; failures
//! propagate and fail the whole turn (no retry, no partial answer).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::action::{FunctionSpec, ToolCall};
use crate::error::Result;
use crate::message::Message;

/// Configuration for one model exchange
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Model identifier (e.g. "gpt-4o-mini")
    pub model: String,

    /// Sampling temperature. Zero keeps tool-call formatting reproducible,
    /// which the classifier depends on.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.0
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Raw output of one model exchange, before classification.
///
/// Providers are not uniform: some return a native structured tool-call
/// field, some embed the call in the text body (possibly wrapped in
/// sentinel markers). Both channels are preserved here and the classifier
/// decides which wins.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawModelOutput {
    /// Free-form text content (may be empty when a native call is present)
    pub content: String,

    /// Provider-native structured call, when the provider supports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
}

impl RawModelOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_call: None,
        }
    }

    pub fn native_call(call: ToolCall) -> Self {
        Self {
            content: String::new(),
            tool_call: Some(call),
        }
    }
}

/// Model Gateway trait
///
/// The turn engine works exclusively through this interface; swapping
/// providers or substituting a scripted double in tests requires no
/// changes to orchestration logic.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the conversation and function catalogue to the model and
    /// return its raw output. `history` must begin with exactly one
    /// system message; an empty catalogue forces a text-only reply.
    async fn converse(
        &self,
        history: &[Message],
        catalogue: &[FunctionSpec],
        options: &GenerationOptions,
    ) -> Result<RawModelOutput>;
}
