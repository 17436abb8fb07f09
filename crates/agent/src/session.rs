//! Per-session conversation context.
//!
//! A session owns the tool set built for one document and credential,
//! plus the turn history. `ask` takes `&mut self`, so a session runs one
//! turn at a time; a failed turn records nothing and leaves the session
//! usable for the next question.

use chrono::{DateTime, Utc};
use paperchat_core::AppResult;
use serde::Serialize;

use crate::citations::{CitationExtractor, Citations};
use crate::orchestrator::Orchestrator;
use crate::tools::ToolSet;
use crate::translate::Translator;

/// One completed question/answer exchange.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    pub question: String,

    /// The translated question, when the translation pre-step ran and
    /// succeeded
    pub translated: Option<String>,

    pub answer: String,

    /// Pages cited for the answer; empty when unsupported or no-information
    pub cited_pages: Vec<String>,

    pub asked_at: DateTime<Utc>,
}

/// What the caller presents for a finished turn.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub answer: String,
    pub citations: Citations,
}

/// Conversation state for one document and credential.
pub struct SessionContext {
    credential: String,
    tools: ToolSet,
    orchestrator: Orchestrator,
    translator: Option<Translator>,
    extractor: CitationExtractor,
    history: Vec<ConversationTurn>,
}

impl SessionContext {
    pub fn new(credential: impl Into<String>, tools: ToolSet, orchestrator: Orchestrator) -> Self {
        Self {
            credential: credential.into(),
            tools,
            orchestrator,
            translator: None,
            extractor: CitationExtractor::new(),
            history: Vec::new(),
        }
    }

    /// Enable the translation pre-step.
    pub fn with_translator(mut self, translator: Translator) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Replace the default citation extractor.
    pub fn with_extractor(mut self, extractor: CitationExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// The credential this session's indices were built with.
    pub fn credential(&self) -> &str {
        &self.credential
    }

    /// Completed turns, oldest first.
    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    /// Run one full turn: translate, orchestrate, extract citations.
    pub async fn ask(&mut self, question: &str) -> AppResult<TurnReport> {
        let asked_at = Utc::now();

        let translated = match &self.translator {
            Some(translator) => translator.translate(question).await,
            None => None,
        };
        let effective = translated.as_deref().unwrap_or(question);

        let outcome = self.orchestrator.run(effective, &self.tools).await?;
        let citations = self.extractor.extract(&outcome.answer, &outcome.invocations);

        let cited_pages = match &citations {
            Citations::Pages(pages) => pages.clone(),
            Citations::Unsupported | Citations::NoInformation => Vec::new(),
        };

        self.history.push(ConversationTurn {
            question: question.to_string(),
            translated,
            answer: outcome.answer.clone(),
            cited_pages,
            asked_at,
        });

        Ok(TurnReport {
            answer: outcome.answer,
            citations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{RetrievedPassage, Tool, ToolOutput};
    use paperchat_core::AppResult;
    use paperchat_llm::{LlmClient, MockClient, ToolSpec};
    use std::sync::Arc;

    struct StaticTool;

    #[async_trait::async_trait]
    impl Tool for StaticTool {
        fn name(&self) -> &str {
            "vector_tool_doc"
        }

        fn spec(&self) -> ToolSpec {
            ToolSpec {
                name: "vector_tool_doc".to_string(),
                description: "retrieval".to_string(),
                parameters: serde_json::json!({"type": "object", "properties": {}}),
            }
        }

        async fn invoke(&self, _args: serde_json::Value) -> AppResult<ToolOutput> {
            Ok(ToolOutput {
                answer: "tool answer".to_string(),
                retrieved: vec![RetrievedPassage {
                    text: "text".to_string(),
                    page_label: Some("7".to_string()),
                    score: 0.8,
                }],
            })
        }
    }

    fn session(llm: Arc<MockClient>) -> SessionContext {
        let mut tools = ToolSet::new();
        tools.add(Arc::new(StaticTool)).unwrap();
        let orchestrator = Orchestrator::new(llm as Arc<dyn LlmClient>, "m");
        SessionContext::new("sk-test", tools, orchestrator)
    }

    #[tokio::test]
    async fn test_ask_records_turn_with_citations() {
        let llm = Arc::new(MockClient::new());
        llm.push_tool_call("call_1", "vector_tool_doc", serde_json::json!({}));
        llm.push_text("It is on page 7.");

        let mut session = session(llm);
        let report = session.ask("where is it?").await.unwrap();

        assert_eq!(report.answer, "It is on page 7.");
        assert_eq!(report.citations, Citations::Pages(vec!["7".to_string()]));

        let history = session.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].question, "where is it?");
        assert_eq!(history[0].cited_pages, vec!["7"]);
        assert!(history[0].translated.is_none());
    }

    #[tokio::test]
    async fn test_failed_turn_leaves_session_usable() {
        let llm = Arc::new(MockClient::new());
        // First turn exhausts an empty script and fails
        let mut session = session(Arc::clone(&llm));
        assert!(session.ask("first").await.is_err());
        assert!(session.history().is_empty());

        // Second turn succeeds
        llm.push_text("recovered");
        let report = session.ask("second").await.unwrap();
        assert_eq!(report.answer, "recovered");
        assert_eq!(session.history().len(), 1);
    }

    #[tokio::test]
    async fn test_translation_feeds_the_agent() {
        let llm = Arc::new(MockClient::new());
        // Translation call, then the agent answers directly
        llm.push_text("pregunta traducida");
        llm.push_text("respuesta");

        let translator =
            Translator::new(Arc::clone(&llm) as Arc<dyn LlmClient>, "m", "Spanish");
        let mut session = session(Arc::clone(&llm)).with_translator(translator);

        let report = session.ask("original question").await.unwrap();
        assert_eq!(report.answer, "respuesta");

        let turn = &session.history()[0];
        assert_eq!(turn.question, "original question");
        assert_eq!(turn.translated.as_deref(), Some("pregunta traducida"));
    }

    #[tokio::test]
    async fn test_unsupported_answer_has_no_cited_pages() {
        let llm = Arc::new(MockClient::new());
        llm.push_text("A claim with no tool backing.");

        let mut session = session(llm);
        let report = session.ask("q").await.unwrap();

        assert_eq!(report.citations, Citations::Unsupported);
        assert!(session.history()[0].cited_pages.is_empty());
    }

    #[tokio::test]
    async fn test_credential_accessor() {
        let llm = Arc::new(MockClient::new());
        let session = session(llm);
        assert_eq!(session.credential(), "sk-test");
    }
}
