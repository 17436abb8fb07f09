//! LLM integration crate for the paperchat CLI.
//!
//! This crate provides a provider-agnostic abstraction for interacting with
//! Large Language Models. Two call shapes are supported: plain completion
//! (used for translation and answer synthesis) and tool-calling chat (used
//! by the agent orchestrator to route questions to document tools).
//!
//! # Providers
//! - **OpenAI**: chat-completions API (default)
//! - **Mock**: scripted client for tests
//!
//! # Example
//! ```no_run
//! use paperchat_llm::{LlmClient, LlmRequest, providers::OpenAiClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OpenAiClient::new("sk-...");
//! let request = LlmRequest::new("Hello, world!", "gpt-3.5-turbo");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{
    ChatMessage, ChatRequest, ChatResponse, LlmClient, LlmRequest, LlmResponse, LlmUsage, Role,
    ToolCall, ToolSpec,
};
pub use factory::create_client;
pub use providers::{MockClient, OpenAiClient};
