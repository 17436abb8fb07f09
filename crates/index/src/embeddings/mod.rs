//! Embedding providers for the retrieval index.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{MockEmbedder, OpenAiEmbedder};
