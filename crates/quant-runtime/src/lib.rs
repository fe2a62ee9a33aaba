//! # quant-runtime
//!
//! Model Gateway implementations for the quant trading agent.
//!
//! ## Providers
//!
//! - **OpenAI** (default): chat-completions with native function calling.
//!   Any OpenAI-compatible endpoint works via `OPENAI_BASE_URL`; Llama
//!   endpoints that emit sentinel-marked inline calls are handled by the
//!   core classifier.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quant_runtime::OpenAiProvider;
//!
//! let provider = OpenAiProvider::from_env()?;
//! let output = provider.converse(&messages, &catalogue, &options).await?;
//! ```

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::{OpenAiConfig, OpenAiProvider};

// Re-export core types for convenience
pub use quant_core::{AgentError, ChatModel, GenerationOptions, Message, RawModelOutput, Result};
