//! Shared data types for document indexing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A raw text segment produced by the document loader.
///
/// One segment per page; the chunker turns segments into passages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    /// Extracted page text
    pub text: String,

    /// Page label ("1", "2", ...), absent when the source has no page info
    pub page_label: Option<String>,
}

/// A bounded span of document text plus page metadata: the unit of retrieval.
///
/// Passages are immutable once created. Indices share one passage set via
/// `Arc<[Passage]>` rather than copying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    /// Passage text
    pub text: String,

    /// Page label inherited from the source segment
    pub page_label: Option<String>,

    /// Ordinal position within the document, 0-based
    pub position: u32,
}

/// Shared, immutable passage snapshot owned by the indices.
pub type PassageSet = Arc<[Passage]>;

/// A passage with its similarity score from a retrieval query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    /// The retrieved passage
    pub passage: Passage,

    /// Cosine similarity against the query embedding
    pub score: f32,
}
