//! Retrieval index: similarity search plus compact answer synthesis.
//!
//! Ranking and synthesis are delegated: an `EmbeddingProvider` supplies the
//! vectors and an `LlmClient` writes the answer. This module owns the
//! passage snapshot, the cosine ranking, the page filter, and the compact
//! (single-call) synthesis mode.

use std::sync::Arc;

use paperchat_core::{AppError, AppResult};
use paperchat_llm::{LlmClient, LlmRequest};

use crate::embeddings::EmbeddingProvider;
use crate::types::{PassageSet, ScoredPassage};

/// A query against the retrieval index.
#[derive(Debug, Clone)]
pub struct RetrievalQuery {
    /// The question to answer
    pub question: String,

    /// Restrict candidates to these page labels (OR semantics).
    /// Empty means all passages are eligible.
    pub page_filter: Vec<String>,
}

/// Answer synthesized from the top-ranked passages.
#[derive(Debug, Clone)]
pub struct RetrievalAnswer {
    /// Synthesized answer text
    pub answer: String,

    /// The passages the answer was grounded in, best first
    pub retrieved: Vec<ScoredPassage>,
}

/// Similarity index over a fixed passage snapshot.
///
/// Built once; queries never mutate it. Passage counts are capped upstream,
/// which is what makes the compact synthesis mode (one LLM call over the
/// concatenated top-k) acceptable latency-wise.
pub struct RetrievalIndex {
    passages: PassageSet,
    embeddings: Vec<Vec<f32>>,
    embedder: Arc<dyn EmbeddingProvider>,
    llm: Arc<dyn LlmClient>,
    model: String,
    top_k: usize,
}

impl RetrievalIndex {
    /// Build the index by embedding every passage.
    pub async fn build(
        passages: PassageSet,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        top_k: usize,
    ) -> AppResult<Self> {
        tracing::info!("Building retrieval index over {} passages", passages.len());

        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let embeddings = embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| AppError::IndexBuild(format!("Passage embedding failed: {}", e)))?;

        Ok(Self {
            passages,
            embeddings,
            embedder,
            llm,
            model: model.into(),
            top_k,
        })
    }

    /// Number of passages in the snapshot.
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// Answer a question from the top-k most similar passages.
    pub async fn query(&self, query: &RetrievalQuery) -> AppResult<RetrievalAnswer> {
        tracing::debug!(
            question = %query.question,
            page_filter = ?query.page_filter,
            "Retrieval query"
        );

        let query_embedding = self.embedder.embed(&query.question).await?;

        let retrieved = self.rank(&query_embedding, &query.page_filter);

        if retrieved.is_empty() {
            tracing::info!("No passages matched the query constraints");
            return Ok(RetrievalAnswer {
                answer: "No matching passages were found in the document.".to_string(),
                retrieved,
            });
        }

        let answer = self.synthesize(&query.question, &retrieved).await?;

        Ok(RetrievalAnswer { answer, retrieved })
    }

    /// Rank candidate passages by cosine similarity, best first.
    fn rank(&self, query_embedding: &[f32], page_filter: &[String]) -> Vec<ScoredPassage> {
        let mut scored: Vec<ScoredPassage> = self
            .passages
            .iter()
            .zip(self.embeddings.iter())
            .filter(|(passage, _)| {
                if page_filter.is_empty() {
                    return true;
                }
                passage
                    .page_label
                    .as_ref()
                    .is_some_and(|label| page_filter.contains(label))
            })
            .map(|(passage, embedding)| ScoredPassage {
                passage: passage.clone(),
                score: cosine_similarity(query_embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.top_k);
        scored
    }

    /// Compact synthesis: one LLM call over the concatenated passages.
    async fn synthesize(
        &self,
        question: &str,
        retrieved: &[ScoredPassage],
    ) -> AppResult<String> {
        let context: Vec<String> = retrieved
            .iter()
            .enumerate()
            .map(|(i, scored)| format!("[Passage {}]\n{}", i + 1, scored.passage.text))
            .collect();

        let prompt = format!(
            "Question:\n{}\n\nRelevant passages from the document:\n{}",
            question,
            context.join("\n\n---\n\n")
        );

        let system = "You are answering questions about a single document. \
                      Answer only from the passages provided. \
                      If the passages do not contain the answer, say the \
                      information is not mentioned in the document.";

        let request = LlmRequest::new(prompt, &self.model)
            .with_system(system)
            .with_temperature(0.3);

        let response = self.llm.complete(&request).await?;
        Ok(response.content)
    }
}

/// Cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockEmbedder;
    use crate::types::Passage;
    use paperchat_llm::MockClient;

    fn passage(text: &str, page: &str, position: u32) -> Passage {
        Passage {
            text: text.to_string(),
            page_label: Some(page.to_string()),
            position,
        }
    }

    async fn build_index(passages: Vec<Passage>, llm: Arc<MockClient>, top_k: usize) -> RetrievalIndex {
        RetrievalIndex::build(
            Arc::from(passages),
            Arc::new(MockEmbedder::new(384)),
            llm,
            "mock-model",
            top_k,
        )
        .await
        .unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_query_ranks_relevant_passage_first() {
        let llm = Arc::new(MockClient::new());
        llm.push_text("The salary range is discussed.");

        let index = build_index(
            vec![
                passage("completely unrelated cooking recipe with garlic", "1", 0),
                passage("annual salary compensation package details", "2", 1),
                passage("another unrelated gardening paragraph about tulips", "3", 2),
            ],
            Arc::clone(&llm),
            2,
        )
        .await;

        let result = index
            .query(&RetrievalQuery {
                question: "what is the salary compensation?".to_string(),
                page_filter: vec![],
            })
            .await
            .unwrap();

        assert_eq!(result.retrieved.len(), 2);
        assert_eq!(result.retrieved[0].passage.page_label.as_deref(), Some("2"));
        assert!(result.retrieved[0].score >= result.retrieved[1].score);
        assert_eq!(result.answer, "The salary range is discussed.");
    }

    #[tokio::test]
    async fn test_page_filter_excludes_other_pages() {
        let llm = Arc::new(MockClient::new());
        llm.push_text("answer");

        let index = build_index(
            vec![
                passage("first page text about the role", "1", 0),
                passage("fifth page text about the interview", "5", 1),
                passage("more fifth page text about preparation", "5", 2),
            ],
            Arc::clone(&llm),
            3,
        )
        .await;

        let result = index
            .query(&RetrievalQuery {
                question: "interview preparation".to_string(),
                page_filter: vec!["5".to_string()],
            })
            .await
            .unwrap();

        assert!(!result.retrieved.is_empty());
        for scored in &result.retrieved {
            assert_eq!(scored.passage.page_label.as_deref(), Some("5"));
        }
    }

    #[tokio::test]
    async fn test_filter_matching_nothing_skips_synthesis() {
        let llm = Arc::new(MockClient::new());

        let index = build_index(
            vec![passage("only page one content here", "1", 0)],
            Arc::clone(&llm),
            3,
        )
        .await;

        let result = index
            .query(&RetrievalQuery {
                question: "anything".to_string(),
                page_filter: vec!["9".to_string()],
            })
            .await
            .unwrap();

        assert!(result.retrieved.is_empty());
        assert!(result.answer.contains("No matching passages"));
        // No synthesis call was made against the empty script
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_top_k_bounds_results() {
        let llm = Arc::new(MockClient::new());
        llm.push_text("answer");

        let passages: Vec<Passage> = (0..10)
            .map(|i| passage(&format!("passage number {} about topics", i), "1", i))
            .collect();
        let index = build_index(passages, Arc::clone(&llm), 3).await;

        let result = index
            .query(&RetrievalQuery {
                question: "topics".to_string(),
                page_filter: vec![],
            })
            .await
            .unwrap();

        assert_eq!(result.retrieved.len(), 3);
    }
}
