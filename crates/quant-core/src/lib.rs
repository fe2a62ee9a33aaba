//! # quant-core
//!
//! Provider-agnostic tool-call orchestration for the SUI quant trading agent.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        TurnEngine                            │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────────────────┐  │
//! │  │ Classifier │  │   Action   │  │   ChatModel            │  │
//! │  │  (pure fn) │──│  Registry  │──│   (Model Gateway)      │  │
//! │  └────────────┘  └────────────┘  └────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! One user turn drives at most one backend action: the engine sends the
//! conversation plus the function catalogue to the model, classifies the
//! reply as text or a tool call, enforces the wallet-connection policy in
//! code, dispatches the call, and optionally loops back through the model
//! once to phrase the result. The `ChatModel` trait makes the provider
//! swappable (OpenAI, Atoma, test doubles) without touching agent logic.

pub mod action;
pub mod classify;
pub mod error;
pub mod message;
pub mod policy;
pub mod provider;
pub mod turn;

pub use action::{Action, ActionRegistry, ActionReply, FunctionSpec, ToolCall};
pub use classify::{classify, ModelReply};
pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role};
pub use policy::WalletContext;
pub use provider::{ChatModel, GenerationOptions, RawModelOutput};
pub use turn::{EngineConfig, TurnEngine, TurnReply};
