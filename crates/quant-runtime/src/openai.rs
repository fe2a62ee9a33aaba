//! OpenAI Chat-Completions Provider
//!
//! Implementation of `ChatModel` for the OpenAI API (or any compatible
//! endpoint). One `converse` is one POST to `/chat/completions` with the
//! function catalogue attached as `tools` and `tool_choice: "auto"`; the
//! request carries an explicit timeout so a stalled provider fails the
//! turn instead of hanging it.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use quant_core::{
    action::{FunctionSpec, ToolCall},
    error::{AgentError, Result},
    message::Message,
    provider::{ChatModel, GenerationOptions, RawModelOutput},
};

/// OpenAI provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// API key (required)
    pub api_key: String,

    /// Base URL, e.g. "https://api.openai.com/v1"
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl OpenAiConfig {
    /// Read configuration from the environment. A missing API key is a
    /// configuration error reported before any processing starts.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AgentError::Config("OPENAI_API_KEY is not set".into()))?;
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".into());

        Ok(Self {
            api_key,
            base_url,
            timeout_secs: 60,
        })
    }
}

/// OpenAI chat-completions provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create from configuration
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OpenAiConfig::from_env()?)
    }

    /// Convert agent messages to the chat-completions wire shape. An
    /// assistant message that issued a call carries it as a `tool_calls`
    /// array; the API rejects a `tool`-role message whose preceding
    /// assistant message lacks one.
    fn convert_messages(messages: &[Message]) -> Vec<Value> {
        messages
            .iter()
            .map(|m| {
                let mut obj = json!({
                    "role": m.role.to_string(),
                    "content": m.content,
                });
                if let Some(id) = &m.tool_call_id {
                    obj["tool_call_id"] = Value::String(id.clone());
                }
                if let Some(call) = &m.tool_call {
                    // Arguments go over the wire as a JSON-encoded string
                    let arguments = serde_json::to_string(&call.arguments)
                        .unwrap_or_else(|_| "{}".into());
                    obj["tool_calls"] = json!([{
                        "id": call.id.clone().unwrap_or_default(),
                        "type": "function",
                        "function": {
                            "name": call.name,
                            "arguments": arguments,
                        },
                    }]);
                }
                obj
            })
            .collect()
    }

    /// Build the request body. An empty catalogue omits `tools` entirely,
    /// which forces a text-only reply.
    fn build_body(
        messages: &[Message],
        catalogue: &[FunctionSpec],
        options: &GenerationOptions,
    ) -> Value {
        let mut body = json!({
            "model": options.model,
            "messages": Self::convert_messages(messages),
            "temperature": options.temperature,
            "max_tokens": options.max_tokens,
        });

        if !catalogue.is_empty() {
            body["tools"] = Value::Array(
                catalogue
                    .iter()
                    .map(FunctionSpec::to_openai_tool)
                    .collect(),
            );
            body["tool_choice"] = Value::String("auto".into());
        }

        body
    }

    /// Convert a parsed completion to raw model output
    fn into_raw_output(completion: ChatCompletion) -> Result<RawModelOutput> {
        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("completion contained no choices".into()))?;

        let tool_call = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|tc| ToolCall::from_parts(tc.function.name, tc.function.arguments.as_ref(), tc.id));

        Ok(RawModelOutput {
            content: choice.message.content.unwrap_or_default(),
            tool_call,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiProvider {
    async fn converse(
        &self,
        history: &[Message],
        catalogue: &[FunctionSpec],
        options: &GenerationOptions,
    ) -> Result<RawModelOutput> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let body = Self::build_body(history, catalogue, options);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    AgentError::ProviderUnavailable(e.to_string())
                } else {
                    AgentError::Provider(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "provider returned an error");
            return Err(match status.as_u16() {
                401 | 403 => AgentError::Auth(format!("provider rejected credentials: {status}")),
                429 => AgentError::RateLimited(detail),
                _ => AgentError::Provider(format!("{status}: {detail}")),
            });
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("undecodable completion: {e}")))?;

        Self::into_raw_output(completion)
    }
}

// Wire types for the chat-completions response

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: Option<String>,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    /// Arguments arrive as a JSON-encoded string on the wire
    #[serde(default)]
    arguments: Option<Value>,
}
