//! Response Classifier
//!
//! Determines whether raw model output is free text or a function call.
//! The output format is not uniform across providers, so several
//! encodings are tolerated, in priority order:
//!
//! 1. provider-native structured call field (highest confidence)
//! 2. text wrapped in Llama sentinel markers (`<|python_tag|>`, `<|eom_id|>`)
//! 3. text beginning with `{` that parses as JSON with `"type": "function"`
//! 4. anything else is the final text answer
//!
//! A JSON parse failure never fails the turn; the raw (sentinel-stripped)
//! text becomes the answer and the failure is logged.

use serde_json::Value;

use crate::action::ToolCall;
use crate::provider::RawModelOutput;

/// Llama-style marker preceding an inline function-call body
pub const PYTHON_TAG: &str = "<|python_tag|>";

/// Llama-style end-of-message marker
pub const EOM_ID: &str = "<|eom_id|>";

/// Classified model output
#[derive(Clone, Debug)]
pub enum ModelReply {
    /// Final text answer
    Text(String),

    /// Structured function invocation
    Call(ToolCall),
}

/// Classify raw model output. Pure function: no hidden state, same input
/// always yields the same classification.
pub fn classify(output: &RawModelOutput) -> ModelReply {
    if let Some(call) = &output.tool_call {
        return ModelReply::Call(call.clone());
    }

    let content = strip_sentinels(&output.content);

    if content.starts_with('{') {
        match parse_call_json(&content) {
            Some(call) => return ModelReply::Call(call),
            None => {
                tracing::warn!(
                    preview = %content.chars().take(80).collect::<String>(),
                    "model output looked like a call but did not parse; treating as text"
                );
            }
        }
    }

    ModelReply::Text(content)
}

/// Remove provider sentinel markers and surrounding whitespace
fn strip_sentinels(content: &str) -> String {
    let mut cleaned = content.to_string();
    for marker in [PYTHON_TAG, EOM_ID] {
        if cleaned.contains(marker) {
            cleaned = cleaned.replace(marker, "");
        }
    }
    cleaned.trim().to_string()
}

/// Parse an inline JSON function call. Accepts the
/// `{"type": "function", "function": {"name": ..., "arguments": ...}}`
/// envelope; `arguments` may be an object or a JSON-encoded string.
fn parse_call_json(text: &str) -> Option<ToolCall> {
    let value: Value = serde_json::from_str(text).ok()?;

    if value.get("type").and_then(Value::as_str) != Some("function") {
        return None;
    }

    let body = value.get("function").unwrap_or(&value);
    let name = body.get("name").and_then(Value::as_str)?;
    let id = value
        .get("id")
        .and_then(Value::as_str)
        .map(ToString::to_string);

    Some(ToolCall::from_parts(name, body.get("arguments"), id))
}
