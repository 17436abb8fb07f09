//! Embedding provider trait and factory.

use paperchat_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "openai", "mock")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::IndexBuild("No embedding returned".to_string()))
    }
}

/// Create an embedding provider based on the provider name.
pub fn create_provider(
    provider: &str,
    model: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider {
        "openai" => {
            let api_key = api_key.ok_or(AppError::MissingCredential)?;
            let embedder = match endpoint {
                Some(url) => super::providers::OpenAiEmbedder::with_base_url(api_key, model, url),
                None => super::providers::OpenAiEmbedder::new(api_key, model),
            };
            Ok(Arc::new(embedder))
        }

        "mock" => Ok(Arc::new(super::providers::MockEmbedder::new(384))),

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: openai, mock",
            provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_provider() {
        let provider = create_provider("mock", "trigram-v1", None, None).unwrap();
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_openai_requires_api_key() {
        let result = create_provider("openai", "text-embedding-3-small", None, None);
        assert!(matches!(result, Err(AppError::MissingCredential)));
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider("unknown", "m", None, None);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider("mock", "trigram-v1", None, None).unwrap();
        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
