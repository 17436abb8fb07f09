//! Document indexing for the paperchat CLI.
//!
//! Turns one PDF into two queryable structures over a shared passage set:
//! a retrieval index (similarity search + compact answer synthesis) and a
//! summary index (hierarchical tree reduce). Builds are memoized behind a
//! single-flight cache for the process lifetime.

pub mod cache;
pub mod chunker;
pub mod embeddings;
pub mod loader;
pub mod retrieval;
pub mod summary;
pub mod types;

// Re-export commonly used types
pub use cache::{CacheKey, IndexCache};
pub use chunker::{chunk_document, ChunkOutcome};
pub use embeddings::{create_provider, EmbeddingProvider, MockEmbedder};
pub use loader::load_pdf;
pub use retrieval::{RetrievalAnswer, RetrievalIndex, RetrievalQuery};
pub use summary::SummaryIndex;
pub use types::{Passage, PassageSet, ScoredPassage, Segment};
