//! Function Catalogue and Backend Actions
//!
//! The catalogue is the contract between the model and the server: every
//! dispatchable operation is declared as a `FunctionSpec`, advertised to
//! the model on every turn, and kept in lockstep with the registry by
//! construction. A call naming anything outside the catalogue is fatal
//! for the turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Tool call request produced by the classifier
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Function identifier; must name a catalogue entry
    pub name: String,

    /// Arguments as key-value pairs
    pub arguments: HashMap<String, Value>,

    /// Optional call ID for round-tripping into tool messages
    #[serde(default)]
    pub id: Option<String>,
}

impl ToolCall {
    /// Build a call from a name plus an arguments value that may be an
    /// object, a JSON-encoded string (OpenAI sends arguments as a string),
    /// or absent.
    pub fn from_parts(name: impl Into<String>, arguments: Option<&Value>, id: Option<String>) -> Self {
        Self {
            name: name.into(),
            arguments: arguments.map(parse_arguments).unwrap_or_default(),
            id,
        }
    }
}

/// Decode an arguments value into a flat map
fn parse_arguments(value: &Value) -> HashMap<String, Value> {
    match value {
        Value::Object(map) => map.clone().into_iter().collect(),
        Value::String(raw) => serde_json::from_str::<Value>(raw)
            .ok()
            .as_ref()
            .map(parse_arguments)
            .unwrap_or_default(),
        _ => HashMap::new(),
    }
}

/// Parameter definition for a catalogue entry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

impl ParameterSchema {
    pub fn required(name: &str, param_type: &str, description: &str) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
            required: true,
        }
    }
}

/// Catalogue entry describing one dispatchable function
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Unique function identifier
    pub name: String,

    /// Human-readable description (shown to the model)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,

    /// Whether the action's result is fed back through the model for a
    /// final natural-language phrasing pass
    #[serde(default)]
    pub follow_up: bool,

    /// Whether the user's wallet must be connected before dispatch.
    /// Enforced in code, not just in the policy prompt.
    #[serde(default)]
    pub requires_wallet: bool,
}

impl FunctionSpec {
    /// Serialize to the OpenAI `tools` wire shape
    pub fn to_openai_tool(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.param_type,
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                },
            },
        })
    }
}

/// What an executed action hands back to the turn engine
#[derive(Clone, Debug)]
pub enum ActionOutput {
    /// Plain text; for follow-up actions this is the tool-result content
    /// fed back to the model
    Text(String),

    /// Structured data surfaced to the caller directly (`type: strategies`)
    Data(Value),
}

/// Result of one action execution
#[derive(Clone, Debug)]
pub struct ActionReply {
    pub output: ActionOutput,

    /// Appended verbatim to the final text, after any phrasing pass.
    /// Used to pin content (wallet keys) that must reach the user even
    /// if the model fails to echo it.
    pub postscript: Option<String>,
}

impl ActionReply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            output: ActionOutput::Text(content.into()),
            postscript: None,
        }
    }

    pub fn data(value: Value) -> Self {
        Self {
            output: ActionOutput::Data(value),
            postscript: None,
        }
    }

    pub fn with_postscript(mut self, postscript: impl Into<String>) -> Self {
        self.postscript = Some(postscript.into());
        self
    }
}

/// Backend action trait - implement to add a dispatchable operation
#[async_trait]
pub trait Action: Send + Sync {
    /// The catalogue entry for this action
    fn spec(&self) -> FunctionSpec;

    /// Execute the action with given arguments
    async fn execute(&self, call: &ToolCall) -> Result<ActionReply>;

    /// Validate arguments before execution. The default checks required
    /// parameter presence; actions add type coercion in their decode step.
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let spec = self.spec();

        for param in &spec.parameters {
            if param.required && !call.arguments.contains_key(&param.name) {
                return Err(AgentError::InvalidArguments(format!(
                    "missing required parameter '{}' for '{}'",
                    param.name, spec.name
                )));
            }
        }

        Ok(())
    }
}

/// Registry of available actions, keyed by catalogue name
pub struct ActionRegistry {
    actions: HashMap<String, Arc<dyn Action>>,
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// Register a new action
    pub fn register<A: Action + 'static>(&mut self, action: A) {
        let spec = action.spec();
        self.actions.insert(spec.name.clone(), Arc::new(action));
    }

    /// Look up the catalogue entry for a name
    pub fn spec_for(&self, name: &str) -> Option<FunctionSpec> {
        self.actions.get(name).map(|a| a.spec())
    }

    /// All catalogue entries (sent to the model every turn)
    pub fn specs(&self) -> Vec<FunctionSpec> {
        self.actions.values().map(|a| a.spec()).collect()
    }

    /// Registered function names
    pub fn names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    /// Number of registered actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Dispatch a classified call: unknown names are fatal and nothing
    /// external is invoked for them; validation runs before execution.
    pub async fn dispatch(&self, call: &ToolCall) -> Result<ActionReply> {
        let action = self
            .actions
            .get(&call.name)
            .ok_or_else(|| AgentError::UnknownFunction(call.name.clone()))?;

        action.validate(call)?;
        action.execute(call).await
    }
}

/// Argument coercion helpers. The model emits an untyped bag; each action
/// decodes it into a concrete record before touching any collaborator.
pub mod args {
    use super::*;

    /// Required string argument
    pub fn string(call: &ToolCall, name: &str) -> Result<String> {
        match call.arguments.get(name) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(AgentError::InvalidArguments(format!(
                "parameter '{}' must be a string, got {}",
                name, other
            ))),
            None => Err(AgentError::InvalidArguments(format!(
                "missing required parameter '{}'",
                name
            ))),
        }
    }

    /// Required numeric argument; numeric strings like "100" are coerced
    pub fn number(call: &ToolCall, name: &str) -> Result<f64> {
        match call.arguments.get(name) {
            Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
                AgentError::InvalidArguments(format!("parameter '{}' is not a finite number", name))
            }),
            Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
                AgentError::InvalidArguments(format!(
                    "parameter '{}' must be numeric, got \"{}\"",
                    name, s
                ))
            }),
            Some(other) => Err(AgentError::InvalidArguments(format!(
                "parameter '{}' must be a number, got {}",
                name, other
            ))),
            None => Err(AgentError::InvalidArguments(format!(
                "missing required parameter '{}'",
                name
            ))),
        }
    }
}
