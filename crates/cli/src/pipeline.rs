//! Shared build pipeline for both commands.
//!
//! Turns configuration plus credential into a ready `SessionContext`:
//! load the PDF, chunk it, build both indices (memoized behind the
//! single-flight cache), wrap them as tools, and wire the orchestrator.

use std::sync::Arc;

use paperchat_agent::{
    CitationExtractor, Orchestrator, SessionContext, SummaryTool, ToolSet, Translator,
    VectorQueryTool,
};
use paperchat_core::{AppConfig, AppResult};
use paperchat_index::{
    chunk_document, create_provider, load_pdf, CacheKey, IndexCache, PassageSet, RetrievalIndex,
    SummaryIndex,
};
use paperchat_llm::create_client;

/// Everything one cache entry holds: both indices over a shared snapshot.
pub struct BuiltIndices {
    pub retrieval: Arc<RetrievalIndex>,
    pub summary: Arc<SummaryIndex>,
    pub truncated: bool,
}

/// Cache of built indices, keyed by collection and credential.
pub type PipelineCache = IndexCache<BuiltIndices>;

/// Build (or reuse) the indices and assemble a session around them.
///
/// Returns the session plus the truncation advisory from chunking so the
/// caller can surface it once.
pub async fn build_session(
    config: &AppConfig,
    cache: &PipelineCache,
    credential: &str,
) -> AppResult<(SessionContext, bool)> {
    let key = CacheKey::new(&config.collection, credential);
    let built = cache
        .get_or_build(&key, || build_indices(config, credential))
        .await?;

    let mut tools = ToolSet::new();
    tools.add(Arc::new(VectorQueryTool::new(
        &config.collection,
        Arc::clone(&built.retrieval),
    )))?;
    tools.add(Arc::new(SummaryTool::new(
        &config.collection,
        Arc::clone(&built.summary),
    )))?;

    let llm = create_client(&config.provider, config.endpoint.as_deref(), Some(credential))?;
    let orchestrator = Orchestrator::new(Arc::clone(&llm), &config.model);

    let mut session = SessionContext::new(credential, tools, orchestrator)
        .with_extractor(CitationExtractor::new().with_cap(config.citation_cap));

    if config.translate {
        session = session.with_translator(Translator::new(
            llm,
            &config.model,
            &config.document_language,
        ));
    }

    Ok((session, built.truncated))
}

/// One full index build: load, chunk, embed, wrap.
async fn build_indices(config: &AppConfig, credential: &str) -> AppResult<Arc<BuiltIndices>> {
    tracing::info!("Building indices for {:?}", config.document);

    let segments = load_pdf(&config.document)?;
    let outcome = chunk_document(&segments, &config.chunking)?;
    let passages: PassageSet = Arc::from(outcome.passages);

    let embedder = create_provider(
        &config.provider,
        &config.embedding_model,
        config.endpoint.as_deref(),
        Some(credential),
    )?;
    let llm = create_client(&config.provider, config.endpoint.as_deref(), Some(credential))?;

    let retrieval = RetrievalIndex::build(
        Arc::clone(&passages),
        embedder,
        Arc::clone(&llm),
        &config.model,
        config.top_k,
    )
    .await?;
    let summary = SummaryIndex::new(passages, llm, &config.model);

    Ok(Arc::new(BuiltIndices {
        retrieval: Arc::new(retrieval),
        summary: Arc::new(summary),
        truncated: outcome.truncated,
    }))
}
