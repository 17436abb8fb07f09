//! OpenAI chat-completions provider.
//!
//! Speaks the `/v1/chat/completions` API, including the function-calling
//! ("tools") extension the agent orchestrator relies on.

use crate::client::{
    ChatMessage, ChatRequest, ChatResponse, LlmClient, LlmRequest, LlmResponse, LlmUsage, Role,
    ToolCall,
};
use paperchat_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Default API endpoint.
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// OpenAI wire message.
#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// OpenAI wire tool call. Arguments arrive as a JSON-encoded string.
#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    arguments: String,
}

/// OpenAI wire tool definition.
#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionDef,
}

#[derive(Debug, Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// OpenAI chat-completions request format.
#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// OpenAI chat-completions response format.
#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    model: String,
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

/// OpenAI LLM client.
pub struct OpenAiClient {
    /// Base URL for the API
    base_url: String,

    /// Bearer credential
    api_key: String,

    /// HTTP client
    client: reqwest::Client,
}

impl OpenAiClient {
    /// Create a new OpenAI client with the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a new OpenAI client with a custom base URL.
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Convert a ChatRequest to the OpenAI wire format.
    fn to_wire_request(&self, request: &ChatRequest) -> OpenAiRequest {
        let messages = request.messages.iter().map(to_wire_message).collect();

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(
                request
                    .tools
                    .iter()
                    .map(|t| WireTool {
                        kind: "function".to_string(),
                        function: WireFunctionDef {
                            name: t.name.clone(),
                            description: t.description.clone(),
                            parameters: t.parameters.clone(),
                        },
                    })
                    .collect(),
            )
        };

        OpenAiRequest {
            model: request.model.clone(),
            messages,
            tools,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        }
    }

    /// Send a wire request and decode the first choice.
    async fn send(&self, wire: &OpenAiRequest) -> AppResult<OpenAiResponse> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(wire)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to OpenAI: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse OpenAI response: {}", e)))
    }
}

/// Convert an abstract chat message to the wire format.
fn to_wire_message(message: &ChatMessage) -> WireMessage {
    let role = match message.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let tool_calls = if message.tool_calls.is_empty() {
        None
    } else {
        Some(
            message
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: call.id.clone(),
                    kind: "function".to_string(),
                    function: WireFunctionCall {
                        name: call.name.clone(),
                        arguments: call.arguments.to_string(),
                    },
                })
                .collect(),
        )
    };

    WireMessage {
        role: role.to_string(),
        content: message.content.clone(),
        tool_calls,
        tool_call_id: message.tool_call_id.clone(),
    }
}

/// Convert a wire message back to the abstract form.
fn from_wire_message(message: WireMessage) -> AppResult<ChatMessage> {
    let role = match message.role.as_str() {
        "system" => Role::System,
        "user" => Role::User,
        "assistant" => Role::Assistant,
        "tool" => Role::Tool,
        other => {
            return Err(AppError::Llm(format!(
                "Unexpected message role from OpenAI: {}",
                other
            )))
        }
    };

    let mut tool_calls = Vec::new();
    for call in message.tool_calls.unwrap_or_default() {
        let arguments: serde_json::Value =
            serde_json::from_str(&call.function.arguments).map_err(|e| {
                AppError::Llm(format!(
                    "Tool call '{}' carried malformed arguments: {}",
                    call.function.name, e
                ))
            })?;

        tool_calls.push(ToolCall {
            id: call.id,
            name: call.function.name,
            arguments,
        });
    }

    Ok(ChatMessage {
        role,
        content: message.content,
        tool_calls,
        tool_call_id: message.tool_call_id,
    })
}

fn convert_usage(usage: Option<OpenAiUsage>) -> LlmUsage {
    match usage {
        Some(u) => LlmUsage::new(u.prompt_tokens, u.completion_tokens),
        None => LlmUsage::default(),
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiClient {
    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!("Sending completion request to OpenAI");

        // Plain completions ride on the chat endpoint
        let mut messages = Vec::new();
        if let Some(ref system) = request.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(request.prompt.clone()));

        let chat = ChatRequest {
            messages,
            model: request.model.clone(),
            tools: Vec::new(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self.chat(&chat).await?;
        let content = response
            .message
            .content
            .ok_or_else(|| AppError::Llm("OpenAI returned an empty completion".to_string()))?;

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: response.usage,
        })
    }

    async fn chat(&self, request: &ChatRequest) -> AppResult<ChatResponse> {
        tracing::debug!(
            "Sending chat request to OpenAI ({} messages, {} tools)",
            request.messages.len(),
            request.tools.len()
        );

        let wire = self.to_wire_request(request);
        let response = self.send(&wire).await?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("OpenAI returned no choices".to_string()))?;

        let message = from_wire_message(choice.message)?;

        tracing::debug!(
            model = %response.model,
            tool_calls = message.tool_calls.len(),
            "Received chat response from OpenAI"
        );

        Ok(ChatResponse {
            message,
            usage: convert_usage(response.usage),
        })
    }
}
