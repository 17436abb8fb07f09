//! Function-calling loop that drives one question to a final answer.
//!
//! The orchestrator sends the question plus tool descriptors to the model,
//! executes whatever tool calls come back, feeds the outputs into the
//! conversation, and repeats until the model produces plain text or the
//! step bound is hit. Any tool or model error fails the whole turn.

use std::sync::Arc;

use paperchat_core::{AppError, AppResult};
use paperchat_llm::{ChatMessage, ChatRequest, LlmClient};

use crate::tools::{ToolOutput, ToolSet};

/// Upper bound on model round-trips per turn.
const DEFAULT_MAX_STEPS: usize = 8;

/// Record of one executed tool call within a turn.
#[derive(Debug, Clone)]
pub struct ToolInvocation {
    pub tool_name: String,
    pub arguments: serde_json::Value,
    pub output: ToolOutput,
}

/// Final result of a turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The model's final text answer
    pub answer: String,

    /// Every tool call executed on the way, in order
    pub invocations: Vec<ToolInvocation>,
}

/// Drives the tool-calling conversation for a single question.
pub struct Orchestrator {
    llm: Arc<dyn LlmClient>,
    model: String,
    max_steps: usize,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Override the step bound.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(1);
        self
    }

    /// Answer one question using the given tools.
    pub async fn run(&self, question: &str, tools: &ToolSet) -> AppResult<TurnOutcome> {
        let system = "You answer questions about a single document using the \
                      provided tools. Always consult a tool before answering. \
                      If the tools do not surface the information, say so \
                      plainly instead of guessing.";

        let mut messages = vec![ChatMessage::system(system), ChatMessage::user(question)];
        let mut invocations = Vec::new();

        for step in 0..self.max_steps {
            let request = ChatRequest::new(messages.clone(), &self.model)
                .with_tools(tools.specs())
                .with_temperature(0.0);

            let response = self.llm.chat(&request).await?;
            let message = response.message;

            if message.tool_calls.is_empty() {
                let answer = message.content.ok_or_else(|| {
                    AppError::Turn("Model returned neither text nor tool calls".to_string())
                })?;
                tracing::debug!(steps = step + 1, tools_used = invocations.len(), "Turn finished");
                return Ok(TurnOutcome { answer, invocations });
            }

            let calls = message.tool_calls.clone();
            messages.push(ChatMessage::assistant_tool_calls(calls.clone()));

            for call in calls {
                let tool = tools.get(&call.name).ok_or_else(|| {
                    AppError::Turn(format!("Model requested unknown tool '{}'", call.name))
                })?;

                tracing::info!(tool = %call.name, "Executing tool call");
                let output = tool.invoke(call.arguments.clone()).await?;

                let payload = serde_json::to_string(&output)
                    .map_err(|e| AppError::Turn(format!("Tool output serialization: {}", e)))?;
                messages.push(ChatMessage::tool(call.id, payload));

                invocations.push(ToolInvocation {
                    tool_name: call.name,
                    arguments: call.arguments,
                    output,
                });
            }
        }

        Err(AppError::Turn(format!(
            "No final answer after {} steps",
            self.max_steps
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{RetrievedPassage, Tool};
    use paperchat_llm::{MockClient, ToolSpec};

    struct EchoTool;

    #[async_trait::async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "vector_tool_doc"
        }

        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "vector_tool_doc".to_string(),
                description: "retrieval".to_string(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": { "query": { "type": "string" } },
                    "required": ["query"]
                }),
            }
        }

        async fn invoke(&self, args: serde_json::Value) -> AppResult<ToolOutput> {
            let query = args["query"].as_str().unwrap_or_default().to_string();
            Ok(ToolOutput {
                answer: format!("found: {}", query),
                retrieved: vec![RetrievedPassage {
                    text: "grounding".to_string(),
                    page_label: Some("4".to_string()),
                    score: 0.9,
                }],
            })
        }
    }

    fn toolset() -> ToolSet {
        let mut set = ToolSet::new();
        set.add(Arc::new(EchoTool)).unwrap();
        set
    }

    #[tokio::test]
    async fn test_tool_call_then_final_answer() {
        let llm = Arc::new(MockClient::new());
        llm.push_tool_call(
            "call_1",
            "vector_tool_doc",
            serde_json::json!({"query": "salary"}),
        );
        llm.push_text("The salary is on page 4.");

        let orchestrator = Orchestrator::new(Arc::clone(&llm) as Arc<dyn LlmClient>, "m");
        let outcome = orchestrator.run("what is the salary?", &toolset()).await.unwrap();

        assert_eq!(outcome.answer, "The salary is on page 4.");
        assert_eq!(outcome.invocations.len(), 1);
        assert_eq!(outcome.invocations[0].tool_name, "vector_tool_doc");
        assert_eq!(
            outcome.invocations[0].output.retrieved[0].page_label.as_deref(),
            Some("4")
        );
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_direct_answer_without_tools() {
        let llm = Arc::new(MockClient::new());
        llm.push_text("Hello.");

        let orchestrator = Orchestrator::new(llm as Arc<dyn LlmClient>, "m");
        let outcome = orchestrator.run("hi", &toolset()).await.unwrap();

        assert_eq!(outcome.answer, "Hello.");
        assert!(outcome.invocations.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tool_fails_turn() {
        let llm = Arc::new(MockClient::new());
        llm.push_tool_call("call_1", "nonexistent", serde_json::json!({}));

        let orchestrator = Orchestrator::new(llm as Arc<dyn LlmClient>, "m");
        let err = orchestrator.run("q", &toolset()).await.unwrap_err();
        assert!(matches!(err, AppError::Turn(_)));
    }

    #[tokio::test]
    async fn test_step_bound_enforced() {
        let llm = Arc::new(MockClient::new());
        // The model keeps calling tools and never settles on text
        for i in 0..3 {
            llm.push_tool_call(
                &format!("call_{}", i),
                "vector_tool_doc",
                serde_json::json!({"query": "again"}),
            );
        }

        let orchestrator =
            Orchestrator::new(llm as Arc<dyn LlmClient>, "m").with_max_steps(3);
        let err = orchestrator.run("q", &toolset()).await.unwrap_err();
        assert!(matches!(err, AppError::Turn(_)));
    }

    #[tokio::test]
    async fn test_model_failure_fails_turn() {
        let llm = Arc::new(MockClient::failing());
        let orchestrator = Orchestrator::new(llm as Arc<dyn LlmClient>, "m");
        assert!(orchestrator.run("q", &toolset()).await.is_err());
    }
}
