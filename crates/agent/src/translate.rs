//! Optional question translation before the agent sees it.
//!
//! Translation failure never fails the turn. The caller gets `None` back
//! and proceeds with the original question.

use std::sync::Arc;

use paperchat_core::{AppError, AppResult};
use paperchat_llm::{LlmClient, LlmRequest};

/// Translates questions into the document's language.
pub struct Translator {
    llm: Arc<dyn LlmClient>,
    model: String,
    target_language: String,
}

impl Translator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            target_language: target_language.into(),
        }
    }

    /// Translate the question, or `None` if translation failed.
    pub async fn translate(&self, question: &str) -> Option<String> {
        match self.request_translation(question).await {
            Ok(translated) => Some(translated),
            Err(e) => {
                tracing::warn!("{}; using the original question", e);
                None
            }
        }
    }

    /// One translation completion, with failures mapped to `Translation`.
    async fn request_translation(&self, question: &str) -> AppResult<String> {
        let prompt = format!(
            "Translate the following question into {}. \
             Reply with only the translated question, nothing else.\n\n{}",
            self.target_language, question
        );

        let request = LlmRequest::new(prompt, &self.model).with_temperature(0.0);

        let response = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| AppError::Translation(e.to_string()))?;

        let translated = response.content.trim().to_string();
        if translated.is_empty() {
            return Err(AppError::Translation(
                "model returned empty text".to_string(),
            ));
        }
        Ok(translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperchat_llm::MockClient;

    #[tokio::test]
    async fn test_translation_success() {
        let llm = Arc::new(MockClient::new());
        llm.push_text("¿Cuál es el salario?");

        let translator = Translator::new(llm as Arc<dyn LlmClient>, "m", "Spanish");
        let translated = translator.translate("What is the salary?").await;
        assert_eq!(translated.as_deref(), Some("¿Cuál es el salario?"));
    }

    #[tokio::test]
    async fn test_translation_failure_degrades() {
        let llm = Arc::new(MockClient::failing());
        let translator = Translator::new(llm as Arc<dyn LlmClient>, "m", "Spanish");
        assert!(translator.translate("question").await.is_none());
    }

    #[tokio::test]
    async fn test_empty_translation_degrades() {
        let llm = Arc::new(MockClient::new());
        llm.push_text("   ");

        let translator = Translator::new(llm as Arc<dyn LlmClient>, "m", "Spanish");
        assert!(translator.translate("question").await.is_none());
    }

    #[tokio::test]
    async fn test_failures_surface_as_translation_errors() {
        let llm = Arc::new(MockClient::failing());
        let translator = Translator::new(llm as Arc<dyn LlmClient>, "m", "Spanish");

        let err = translator.request_translation("question").await.unwrap_err();
        assert!(matches!(err, AppError::Translation(_)));
    }
}
