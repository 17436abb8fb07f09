//! Scripted mock LLM client.
//!
//! Returns pre-loaded responses in order, so tests can drive the agent
//! loop and synthesis paths deterministically without network access.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::client::{
    ChatMessage, ChatRequest, ChatResponse, LlmClient, LlmRequest, LlmResponse, LlmUsage, ToolCall,
};
use paperchat_core::{AppError, AppResult};

/// Mock client for tests.
///
/// Each `chat`/`complete` call pops the next scripted message. An empty
/// script yields an error, as does a client constructed with `failing()`.
pub struct MockClient {
    script: Mutex<VecDeque<ChatMessage>>,
    calls: AtomicUsize,
    fail: bool,
}

impl MockClient {
    /// Create a mock client with an empty script.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// Create a mock client whose every call fails.
    pub fn failing() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    /// Queue a plain text response.
    pub fn push_text(&self, content: impl Into<String>) {
        self.script
            .lock()
            .expect("mock script lock")
            .push_back(ChatMessage::assistant(content));
    }

    /// Queue a tool-call response.
    pub fn push_tool_call(&self, id: &str, name: &str, arguments: serde_json::Value) {
        self.script
            .lock()
            .expect("mock script lock")
            .push_back(ChatMessage::assistant_tool_calls(vec![ToolCall {
                id: id.to_string(),
                name: name.to_string(),
                arguments,
            }]));
    }

    /// Number of calls made against this client.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_message(&self) -> AppResult<ChatMessage> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail {
            return Err(AppError::Llm("mock client configured to fail".to_string()));
        }

        self.script
            .lock()
            .expect("mock script lock")
            .pop_front()
            .ok_or_else(|| AppError::Llm("mock script exhausted".to_string()))
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        let message = self.next_message()?;
        let content = message
            .content
            .ok_or_else(|| AppError::Llm("mock scripted a tool call for complete()".to_string()))?;

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }

    async fn chat(&self, _request: &ChatRequest) -> AppResult<ChatResponse> {
        Ok(ChatResponse {
            message: self.next_message()?,
            usage: LlmUsage::default(),
        })
    }
}
