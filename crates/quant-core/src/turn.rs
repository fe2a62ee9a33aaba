//! Turn Engine
//!
//! Orchestrates one user turn: policy prompt prepended, one gateway call,
//! classification, server-side wallet gating, at most one backend action,
//! and an optional second gateway call to phrase the action result. The
//! one-call-per-turn limit is structural - the engine never loops.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::action::{ActionOutput, ActionRegistry, ToolCall};
use crate::classify::{classify, ModelReply};
use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, Role};
use crate::policy::{WalletContext, WALLET_REFUSAL};
use crate::provider::{ChatModel, GenerationOptions, RawModelOutput};

/// Engine configuration
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Policy prompt prepended as the single system message
    pub system_prompt: String,

    /// Generation options for both gateway calls
    pub generation: GenerationOptions,
}

impl EngineConfig {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            generation: GenerationOptions::default(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.generation.model = model.into();
        self
    }
}

/// Final response for one turn
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "content", rename_all = "lowercase")]
pub enum TurnReply {
    /// Natural-language answer
    Text(String),

    /// Structured strategy list returned to the caller directly
    Strategies(Value),
}

/// The turn engine. Collaborators are injected at construction so tests
/// can substitute scripted doubles.
pub struct TurnEngine {
    provider: Arc<dyn ChatModel>,
    actions: Arc<ActionRegistry>,
    config: EngineConfig,
}

impl TurnEngine {
    pub fn new(
        provider: Arc<dyn ChatModel>,
        actions: Arc<ActionRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            provider,
            actions,
            config,
        }
    }

    /// Run one turn over the client-supplied history.
    ///
    /// The engine owns the system message: client-supplied system messages
    /// are dropped so the history sent to the model begins with exactly
    /// one policy prompt.
    pub async fn run_turn(&self, history: &[Message]) -> Result<TurnReply> {
        let mut conversation = Conversation::with_system_prompt(self.config.system_prompt.clone());
        for message in history.iter().filter(|m| m.role != Role::System) {
            conversation.push(message.clone());
        }

        if conversation.last_user().is_none() {
            return Err(AgentError::MalformedInput(
                "history contains no user message".into(),
            ));
        }

        let wallet = WalletContext::from_history(conversation.messages());
        let catalogue = self.actions.specs();

        let output = self
            .provider
            .converse(conversation.messages(), &catalogue, &self.config.generation)
            .await?;

        let mut call = match classify(&output) {
            ModelReply::Text(text) => return Ok(TurnReply::Text(text)),
            ModelReply::Call(call) => call,
        };

        // Unknown names are catalogue/dispatcher drift: fail the turn
        // before anything external is touched.
        let spec = self
            .actions
            .spec_for(&call.name)
            .ok_or_else(|| AgentError::UnknownFunction(call.name.clone()))?;

        if spec.requires_wallet && !wallet.is_connected() {
            tracing::warn!(
                function = %call.name,
                "model requested a gated action while wallet disconnected; refusing"
            );
            return Ok(TurnReply::Text(WALLET_REFUSAL.into()));
        }

        if call.id.is_none() {
            call.id = Some(uuid::Uuid::new_v4().to_string());
        }

        tracing::debug!(function = %call.name, "dispatching action");
        let reply = self.actions.dispatch(&call).await?;

        match reply.output {
            ActionOutput::Data(value) => Ok(TurnReply::Strategies(value)),
            ActionOutput::Text(text) => {
                let phrased = if spec.follow_up {
                    self.phrase(conversation, &output, &call, &text).await?
                } else {
                    text
                };
                Ok(TurnReply::Text(join_postscript(phrased, reply.postscript)))
            }
        }
    }

    /// Second gateway call: append the assistant's call and the tool
    /// result to the history and ask the model to phrase a final answer.
    /// The call rides on the assistant message structurally, so providers
    /// that require a tool message to answer a `tool_calls`-bearing
    /// assistant message accept the history.
    ///
    /// The action has already run by this point, so a failure here must
    /// not fail the turn: on a provider error the raw tool output becomes
    /// the answer. The same fallback applies if the model emits another
    /// call (one call per turn) - it is not dispatched.
    async fn phrase(
        &self,
        mut conversation: Conversation,
        first_output: &RawModelOutput,
        call: &ToolCall,
        tool_content: &str,
    ) -> Result<String> {
        conversation.push(Message::assistant_call(
            first_output.content.clone(),
            call.clone(),
        ));
        conversation.push(Message::tool(tool_content, call.id.clone()));

        let output = match self
            .provider
            .converse(
                conversation.messages(),
                &self.actions.specs(),
                &self.config.generation,
            )
            .await
        {
            Ok(output) => output,
            Err(err) => {
                tracing::warn!(%err, "phrasing pass failed; returning tool output");
                return Ok(tool_content.to_string());
            }
        };

        match classify(&output) {
            ModelReply::Text(text) if !text.is_empty() => Ok(text),
            ModelReply::Text(_) => Ok(tool_content.to_string()),
            ModelReply::Call(second) => {
                tracing::warn!(
                    function = %second.name,
                    "model emitted a second call in the phrasing pass; not dispatched"
                );
                Ok(tool_content.to_string())
            }
        }
    }
}

fn join_postscript(text: String, postscript: Option<String>) -> String {
    match postscript {
        Some(ps) => format!("{text}\n\n{ps}"),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{Action, ActionReply, FunctionSpec, ParameterSchema};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted model double: pops pre-canned outputs, counts exchanges,
    /// and records each history it was sent. An exhausted script fails
    /// the exchange like an unreachable provider.
    struct ScriptedModel {
        outputs: Mutex<VecDeque<RawModelOutput>>,
        histories: Mutex<Vec<Vec<Message>>>,
        calls: AtomicUsize,
    }

    impl ScriptedModel {
        fn new(outputs: Vec<RawModelOutput>) -> Self {
            Self {
                outputs: Mutex::new(outputs.into()),
                histories: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
            }
        }

        fn exchanges(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn history(&self, exchange: usize) -> Vec<Message> {
            self.histories.lock().unwrap()[exchange].clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        async fn converse(
            &self,
            history: &[Message],
            _catalogue: &[FunctionSpec],
            _options: &GenerationOptions,
        ) -> Result<RawModelOutput> {
            assert_eq!(history[0].role, Role::System, "policy prompt must lead");
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.histories.lock().unwrap().push(history.to_vec());
            self.outputs
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AgentError::ProviderUnavailable("scripted outage".into()))
        }
    }

    /// Counting action double with configurable catalogue flags.
    struct CountingAction {
        spec: FunctionSpec,
        reply: ActionReply,
        executions: Arc<AtomicUsize>,
    }

    impl CountingAction {
        fn new(spec: FunctionSpec, reply: ActionReply) -> (Self, Arc<AtomicUsize>) {
            let executions = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    spec,
                    reply,
                    executions: executions.clone(),
                },
                executions,
            )
        }
    }

    #[async_trait]
    impl Action for CountingAction {
        fn spec(&self) -> FunctionSpec {
            self.spec.clone()
        }

        async fn execute(&self, _call: &ToolCall) -> Result<ActionReply> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    fn spec(name: &str, follow_up: bool, requires_wallet: bool) -> FunctionSpec {
        FunctionSpec {
            name: name.into(),
            description: "test action".into(),
            parameters: Vec::<ParameterSchema>::new(),
            follow_up,
            requires_wallet,
        }
    }

    fn native_call(name: &str) -> RawModelOutput {
        RawModelOutput::native_call(ToolCall::from_parts(name, None, None))
    }

    fn connected_history(said: &str) -> Vec<Message> {
        vec![Message::user(format!(
            "USER WALLET STATUS: CONNECTED\nUSER WALLET ADDRESS: 0xa868fb0f\nUSER USDC BALANCE: 200\nUSER SAID: {said}"
        ))]
    }

    fn engine(
        model: Arc<ScriptedModel>,
        registry: ActionRegistry,
    ) -> TurnEngine {
        TurnEngine::new(
            model,
            Arc::new(registry),
            EngineConfig::new("You are SentientAi."),
        )
    }

    #[tokio::test]
    async fn test_text_reply_passes_through() {
        let model = Arc::new(ScriptedModel::new(vec![RawModelOutput::text("Hello!")]));
        let (action, executions) =
            CountingAction::new(spec("listStrategies", false, true), ActionReply::text("n/a"));
        let mut registry = ActionRegistry::new();
        registry.register(action);

        let reply = engine(model.clone(), registry)
            .run_turn(&connected_history("hi"))
            .await
            .unwrap();

        match reply {
            TurnReply::Text(t) => assert_eq!(t, "Hello!"),
            TurnReply::Strategies(_) => panic!("expected text"),
        }
        assert_eq!(model.exchanges(), 1);
        assert_eq!(executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_function_is_fatal_before_any_action() {
        let model = Arc::new(ScriptedModel::new(vec![native_call("fabricated")]));
        let (action, executions) =
            CountingAction::new(spec("real", false, false), ActionReply::text("out"));
        let mut registry = ActionRegistry::new();
        registry.register(action);

        let err = engine(model, registry)
            .run_turn(&connected_history("do it"))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::UnknownFunction(_)));
        assert_eq!(executions.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wallet_gate_refuses_without_dispatch() {
        let model = Arc::new(ScriptedModel::new(vec![native_call("getAvailableStrategies")]));
        let (action, executions) = CountingAction::new(
            spec("getAvailableStrategies", false, true),
            ActionReply::data(serde_json::json!([])),
        );
        let mut registry = ActionRegistry::new();
        registry.register(action);

        let history = vec![Message::user(
            "USER WALLET STATUS: NOT CONNECTED\nUSER SAID: list strategies",
        )];
        let reply = engine(model.clone(), registry)
            .run_turn(&history)
            .await
            .unwrap();

        match reply {
            TurnReply::Text(t) => assert_eq!(t, WALLET_REFUSAL),
            TurnReply::Strategies(_) => panic!("expected refusal text"),
        }
        assert_eq!(executions.load(Ordering::SeqCst), 0);
        assert_eq!(model.exchanges(), 1, "no phrasing pass for a refusal");
    }

    #[tokio::test]
    async fn test_direct_action_appends_postscript() {
        let model = Arc::new(ScriptedModel::new(vec![native_call("createWallet")]));
        let (action, _) = CountingAction::new(
            spec("createWallet", false, true),
            ActionReply::text("Wallet created.").with_postscript("Public key: 0xabc"),
        );
        let mut registry = ActionRegistry::new();
        registry.register(action);

        let reply = engine(model.clone(), registry)
            .run_turn(&connected_history("make me a wallet"))
            .await
            .unwrap();

        match reply {
            TurnReply::Text(t) => assert_eq!(t, "Wallet created.\n\nPublic key: 0xabc"),
            TurnReply::Strategies(_) => panic!("expected text"),
        }
        assert_eq!(model.exchanges(), 1);
    }

    #[tokio::test]
    async fn test_follow_up_phrasing_round_trip() {
        let model = Arc::new(ScriptedModel::new(vec![
            native_call("startStrategy"),
            RawModelOutput::text("Your strategy is now running."),
        ]));
        let (action, executions) = CountingAction::new(
            spec("startStrategy", true, true),
            ActionReply::text(r#"{"message": "started"}"#).with_postscript("Private key: k1"),
        );
        let mut registry = ActionRegistry::new();
        registry.register(action);

        let reply = engine(model.clone(), registry)
            .run_turn(&connected_history("start S-1"))
            .await
            .unwrap();

        match reply {
            TurnReply::Text(t) => {
                assert_eq!(t, "Your strategy is now running.\n\nPrivate key: k1");
            }
            TurnReply::Strategies(_) => panic!("expected text"),
        }
        assert_eq!(model.exchanges(), 2);
        assert_eq!(executions.load(Ordering::SeqCst), 1);

        // The phrasing history must carry the call on the assistant
        // message and answer it with a matching tool message, or the
        // provider rejects the sequence.
        let phrasing = model.history(1);
        let assistant = &phrasing[phrasing.len() - 2];
        let tool = &phrasing[phrasing.len() - 1];

        assert_eq!(assistant.role, Role::Assistant);
        let carried = assistant.tool_call.as_ref().expect("call on assistant");
        assert_eq!(carried.name, "startStrategy");
        assert_eq!(tool.role, Role::Tool);
        assert_eq!(tool.tool_call_id, carried.id);
    }

    #[tokio::test]
    async fn test_phrasing_outage_falls_back_to_tool_output() {
        // Script covers only the first exchange; the phrasing pass hits
        // a provider failure. The action already ran, so the turn must
        // still succeed with the tool output and pinned postscript.
        let model = Arc::new(ScriptedModel::new(vec![native_call("startStrategy")]));
        let (action, executions) = CountingAction::new(
            spec("startStrategy", true, true),
            ActionReply::text("tool output").with_postscript("Private key: k1"),
        );
        let mut registry = ActionRegistry::new();
        registry.register(action);

        let reply = engine(model.clone(), registry)
            .run_turn(&connected_history("start S-1"))
            .await
            .unwrap();

        match reply {
            TurnReply::Text(t) => assert_eq!(t, "tool output\n\nPrivate key: k1"),
            TurnReply::Strategies(_) => panic!("expected text"),
        }
        assert_eq!(executions.load(Ordering::SeqCst), 1);
        assert_eq!(model.exchanges(), 2);
    }

    #[tokio::test]
    async fn test_second_call_in_phrasing_pass_not_dispatched() {
        let model = Arc::new(ScriptedModel::new(vec![
            native_call("startStrategy"),
            native_call("startStrategy"),
        ]));
        let (action, executions) = CountingAction::new(
            spec("startStrategy", true, true),
            ActionReply::text("tool output"),
        );
        let mut registry = ActionRegistry::new();
        registry.register(action);

        let reply = engine(model, registry)
            .run_turn(&connected_history("start S-1"))
            .await
            .unwrap();

        match reply {
            TurnReply::Text(t) => assert_eq!(t, "tool output"),
            TurnReply::Strategies(_) => panic!("expected text"),
        }
        assert_eq!(executions.load(Ordering::SeqCst), 1, "one call per turn");
    }

    #[tokio::test]
    async fn test_structured_data_skips_phrasing() {
        let strategies = serde_json::json!([{"name": "Strategy 1 for ETH"}]);
        let model = Arc::new(ScriptedModel::new(vec![native_call("getAvailableStrategies")]));
        let (action, _) = CountingAction::new(
            spec("getAvailableStrategies", false, true),
            ActionReply::data(strategies.clone()),
        );
        let mut registry = ActionRegistry::new();
        registry.register(action);

        let reply = engine(model.clone(), registry)
            .run_turn(&connected_history("list strategies"))
            .await
            .unwrap();

        match reply {
            TurnReply::Strategies(v) => assert_eq!(v, strategies),
            TurnReply::Text(_) => panic!("expected strategies"),
        }
        assert_eq!(model.exchanges(), 1);
    }

    #[tokio::test]
    async fn test_history_without_user_message_rejected() {
        let model = Arc::new(ScriptedModel::new(vec![]));
        let err = engine(model, ActionRegistry::new())
            .run_turn(&[Message::assistant("orphan")])
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MalformedInput(_)));
    }

    #[test]
    fn test_turn_reply_wire_shape() {
        let text = serde_json::to_value(TurnReply::Text("hi".into())).unwrap();
        assert_eq!(text["type"], "text");
        assert_eq!(text["content"], "hi");

        let data = serde_json::to_value(TurnReply::Strategies(serde_json::json!([]))).unwrap();
        assert_eq!(data["type"], "strategies");
    }
}
