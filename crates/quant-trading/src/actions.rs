//! Backend Actions
//!
//! The five catalogue operations. Each action decodes the model's untyped
//! argument bag into a concrete record before touching any collaborator,
//! so missing or mistyped arguments are rejected locally and nothing is
//! forwarded to the backend for an invalid call.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use quant_core::{
    action::{args, Action, ActionRegistry, ActionReply, FunctionSpec, ParameterSchema, ToolCall},
    Result,
};

use crate::executor::TradeExecutor;
use crate::model::{available_strategies, RunStrategyRequest};
use crate::wallet::WalletKeygen;

/// `getAvailableStrategies` - static list, returned to the caller as
/// structured data (no phrasing pass; the UI renders the list itself).
pub struct ListStrategiesAction;

#[async_trait]
impl Action for ListStrategiesAction {
    fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: "getAvailableStrategies".into(),
            description: "Retrieves the available strategies for trading. This function should \
                          only be called if the user explicitly requests available trading \
                          strategies."
                .into(),
            parameters: Vec::new(),
            follow_up: false,
            requires_wallet: true,
        }
    }

    async fn execute(&self, _call: &ToolCall) -> Result<ActionReply> {
        Ok(ActionReply::data(serde_json::to_value(
            available_strategies(),
        )?))
    }
}

/// `createWallet` - one keygen invocation, both keys surfaced in the same
/// response. Never touches the trading backend.
pub struct CreateWalletAction {
    keygen: Arc<dyn WalletKeygen>,
}

impl CreateWalletAction {
    pub fn new(keygen: Arc<dyn WalletKeygen>) -> Self {
        Self { keygen }
    }
}

#[async_trait]
impl Action for CreateWalletAction {
    fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: "createWallet".into(),
            description: "Creates a SUI wallet for the user and returns the wallet address and \
                          its private key"
                .into(),
            parameters: Vec::new(),
            follow_up: false,
            requires_wallet: true,
        }
    }

    async fn execute(&self, _call: &ToolCall) -> Result<ActionReply> {
        let credential = self.keygen.generate()?;
        tracing::info!(address = %credential.public_key, "created wallet");

        Ok(ActionReply::text(
            "Here is your new SUI wallet. Store the private key somewhere safe - it cannot be \
             recovered if lost.",
        )
        .with_postscript(format!(
            "Wallet address: {}\nPrivate key: {}",
            credential.public_key, credential.private_key
        )))
    }
}

/// Typed argument record for `startStrategy`
#[derive(Debug)]
struct StartStrategyArgs {
    strategy_id: String,
    amount: f64,
    take_profit: f64,
    stop_loss: f64,
}

impl StartStrategyArgs {
    fn decode(call: &ToolCall) -> Result<Self> {
        Ok(Self {
            strategy_id: args::string(call, "strategyId")?,
            // The model sometimes emits the amount as a string
            amount: args::number(call, "amount")?,
            take_profit: args::number(call, "takeProfitThreshold")?,
            stop_loss: args::number(call, "stopLossThreshold")?,
        })
    }
}

/// `startStrategy` - generates a dedicated wallet for the run and submits
/// it to the trading backend. The keys ride back in the postscript so the
/// user always receives them regardless of how the model phrases the
/// result.
pub struct StartStrategyAction {
    executor: Arc<dyn TradeExecutor>,
    keygen: Arc<dyn WalletKeygen>,
}

impl StartStrategyAction {
    pub fn new(executor: Arc<dyn TradeExecutor>, keygen: Arc<dyn WalletKeygen>) -> Self {
        Self { executor, keygen }
    }
}

#[async_trait]
impl Action for StartStrategyAction {
    fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: "startStrategy".into(),
            description: "Starts a strategy for trading if a new wallet has been created. \
                          Otherwise, call the createWallet tool first."
                .into(),
            parameters: vec![
                ParameterSchema::required("strategyId", "string", "The ID of the strategy"),
                ParameterSchema::required(
                    "amount",
                    "number",
                    "The amount of crypto for the strategy to trade",
                ),
                ParameterSchema::required(
                    "takeProfitThreshold",
                    "number",
                    "The take profit threshold. Most optimal is 0.0075",
                ),
                ParameterSchema::required(
                    "stopLossThreshold",
                    "number",
                    "The stop loss threshold. Most optimal is 0.0075",
                ),
            ],
            follow_up: true,
            requires_wallet: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ActionReply> {
        let decoded = StartStrategyArgs::decode(call)?;
        let credential = self.keygen.generate()?;

        let request = RunStrategyRequest {
            private_key: credential.private_key.clone(),
            quote_symbol_quantity: decoded.amount,
            take_profit: decoded.take_profit,
            stop_loss: decoded.stop_loss,
        };

        tracing::info!(
            strategy = %decoded.strategy_id,
            amount = decoded.amount,
            "submitting strategy run"
        );
        let response = self.executor.run_strategy(&request).await?;

        let tool_content = json!({
            "message": response.message,
            "publicKey": credential.public_key,
            "privateKey": credential.private_key,
        })
        .to_string();

        Ok(ActionReply::text(tool_content).with_postscript(format!(
            "Wallet public key: {}\nWallet private key: {}\nKeep the private key safe - it is \
             the only copy.",
            credential.public_key, credential.private_key
        )))
    }
}

/// `stopStrategy` - acknowledgement stub. There is no backend contract
/// for stopping a run yet, so no state is queried or mutated.
pub struct StopStrategyAction;

#[async_trait]
impl Action for StopStrategyAction {
    fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: "stopStrategy".into(),
            description: "Stops a strategy for trading".into(),
            parameters: vec![ParameterSchema::required(
                "strategyId",
                "string",
                "The ID of the strategy",
            )],
            follow_up: false,
            requires_wallet: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ActionReply> {
        let strategy_id = args::string(call, "strategyId")?;
        Ok(ActionReply::text(format!(
            "Ended strategy {strategy_id}. Let me know if there's anything else I can help you \
             with!"
        )))
    }
}

/// `getStrategyStatus` - acknowledgement stub until the backend exposes a
/// status lookup.
pub struct StrategyStatusAction;

#[async_trait]
impl Action for StrategyStatusAction {
    fn spec(&self) -> FunctionSpec {
        FunctionSpec {
            name: "getStrategyStatus".into(),
            description: "Retrieves the status of a strategy".into(),
            parameters: vec![ParameterSchema::required(
                "strategyId",
                "string",
                "The ID of the strategy",
            )],
            follow_up: false,
            requires_wallet: true,
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ActionReply> {
        let strategy_id = args::string(call, "strategyId")?;
        Ok(ActionReply::text(format!(
            "Strategy {strategy_id} is running. Let me know if there's anything else I can help \
             you with!"
        )))
    }
}

/// Register the full catalogue against its collaborators
pub fn register_actions(
    registry: &mut ActionRegistry,
    executor: Arc<dyn TradeExecutor>,
    keygen: Arc<dyn WalletKeygen>,
) {
    registry.register(ListStrategiesAction);
    registry.register(CreateWalletAction::new(keygen.clone()));
    registry.register(StartStrategyAction::new(executor, keygen));
    registry.register(StopStrategyAction);
    registry.register(StrategyStatusAction);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RunStrategyResponse, WalletCredential};
    use quant_core::action::ActionOutput;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedKeygen {
        generations: AtomicUsize,
    }

    impl FixedKeygen {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                generations: AtomicUsize::new(0),
            })
        }
    }

    impl WalletKeygen for FixedKeygen {
        fn generate(&self) -> Result<WalletCredential> {
            self.generations.fetch_add(1, Ordering::SeqCst);
            Ok(WalletCredential {
                public_key: "0xa868fb0f".into(),
                private_key: "suiprivkey1qpegeh79".into(),
            })
        }
    }

    struct RecordingExecutor {
        requests: Mutex<Vec<RunStrategyRequest>>,
    }

    impl RecordingExecutor {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
            })
        }

        fn submissions(&self) -> Vec<RunStrategyRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TradeExecutor for RecordingExecutor {
        async fn run_strategy(&self, request: &RunStrategyRequest) -> Result<RunStrategyResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(RunStrategyResponse {
                message: "Strategy started".into(),
            })
        }
    }

    fn call(name: &str, arguments: serde_json::Value) -> ToolCall {
        ToolCall::from_parts(name, Some(&arguments), Some("abcd123".into()))
    }

    #[tokio::test]
    async fn test_list_strategies_returns_data() {
        let reply = ListStrategiesAction
            .execute(&call("getAvailableStrategies", json!({})))
            .await
            .unwrap();

        match reply.output {
            ActionOutput::Data(value) => {
                assert_eq!(value[0]["symbol"], "ETH");
                assert_eq!(value[0]["minimumAmount"], 0.01);
            }
            ActionOutput::Text(_) => panic!("expected data"),
        }
    }

    #[tokio::test]
    async fn test_create_wallet_surfaces_both_keys_without_backend() {
        let keygen = FixedKeygen::new();
        let executor = RecordingExecutor::new();
        let action = CreateWalletAction::new(keygen.clone());

        let reply = action
            .execute(&call("createWallet", json!({})))
            .await
            .unwrap();

        let postscript = reply.postscript.expect("keys pinned in postscript");
        assert!(postscript.contains("0xa868fb0f"));
        assert!(postscript.contains("suiprivkey1qpegeh79"));
        assert_eq!(keygen.generations.load(Ordering::SeqCst), 1);
        assert!(executor.submissions().is_empty(), "no trading backend call");
    }

    #[tokio::test]
    async fn test_start_strategy_forwards_wire_body_once() {
        let keygen = FixedKeygen::new();
        let executor = RecordingExecutor::new();
        let action = StartStrategyAction::new(executor.clone(), keygen.clone());

        let reply = action
            .execute(&call(
                "startStrategy",
                json!({
                    "strategyId": "S-1",
                    "amount": 50,
                    "takeProfitThreshold": 0.0075,
                    "stopLossThreshold": 0.0075,
                }),
            ))
            .await
            .unwrap();

        let submissions = executor.submissions();
        assert_eq!(submissions.len(), 1);
        assert_eq!(
            submissions[0],
            RunStrategyRequest {
                private_key: "suiprivkey1qpegeh79".into(),
                quote_symbol_quantity: 50.0,
                take_profit: 0.0075,
                stop_loss: 0.0075,
            }
        );

        match reply.output {
            ActionOutput::Text(tool_content) => {
                assert!(tool_content.contains("Strategy started"));
                assert!(tool_content.contains("0xa868fb0f"));
                assert!(tool_content.contains("suiprivkey1qpegeh79"));
            }
            ActionOutput::Data(_) => panic!("expected text"),
        }
        let postscript = reply.postscript.expect("keys pinned in postscript");
        assert!(postscript.contains("0xa868fb0f"));
        assert!(postscript.contains("suiprivkey1qpegeh79"));
    }

    #[tokio::test]
    async fn test_start_strategy_coerces_string_amount() {
        let executor = RecordingExecutor::new();
        let action = StartStrategyAction::new(executor.clone(), FixedKeygen::new());

        action
            .execute(&call(
                "startStrategy",
                json!({
                    "strategyId": "S-1",
                    "amount": "100",
                    "takeProfitThreshold": 0.0075,
                    "stopLossThreshold": 0.0075,
                }),
            ))
            .await
            .unwrap();

        assert!((executor.submissions()[0].quote_symbol_quantity - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_start_strategy_rejects_bad_amount_before_backend() {
        let executor = RecordingExecutor::new();
        let action = StartStrategyAction::new(executor.clone(), FixedKeygen::new());

        let err = action
            .execute(&call(
                "startStrategy",
                json!({
                    "strategyId": "S-1",
                    "amount": "plenty",
                    "takeProfitThreshold": 0.0075,
                    "stopLossThreshold": 0.0075,
                }),
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            quant_core::AgentError::InvalidArguments(_)
        ));
        assert!(executor.submissions().is_empty());
    }

    #[tokio::test]
    async fn test_stub_actions_echo_strategy_id() {
        let stopped = StopStrategyAction
            .execute(&call("stopStrategy", json!({"strategyId": "S-1"})))
            .await
            .unwrap();
        match stopped.output {
            ActionOutput::Text(text) => assert!(text.contains("S-1")),
            ActionOutput::Data(_) => panic!("expected text"),
        }

        let status = StrategyStatusAction
            .execute(&call("getStrategyStatus", json!({"strategyId": "S-1"})))
            .await
            .unwrap();
        match status.output {
            ActionOutput::Text(text) => assert!(text.contains("S-1")),
            ActionOutput::Data(_) => panic!("expected text"),
        }
    }

    #[test]
    fn test_catalogue_is_complete() {
        let mut registry = ActionRegistry::new();
        register_actions(&mut registry, RecordingExecutor::new(), FixedKeygen::new());

        assert_eq!(registry.len(), 5);
        for name in [
            "getAvailableStrategies",
            "createWallet",
            "startStrategy",
            "stopStrategy",
            "getStrategyStatus",
        ] {
            assert!(registry.spec_for(name).is_some(), "missing {name}");
        }

        // Only startStrategy loops back through the model for phrasing
        assert!(registry.spec_for("startStrategy").unwrap().follow_up);
        assert!(!registry.spec_for("createWallet").unwrap().follow_up);
    }
}
