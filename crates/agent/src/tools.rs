//! Tool adapter: wraps the document indices as LLM-callable tools.
//!
//! Each tool carries a `ToolSpec` (name, description, JSON schema) and an
//! async `invoke` that parses the model's arguments and returns a typed
//! `ToolOutput`. Provenance travels in the output structure itself, so
//! citation extraction never inspects index internals.

use std::collections::HashMap;
use std::sync::Arc;

use paperchat_core::{AppError, AppResult};
use paperchat_index::{RetrievalIndex, RetrievalQuery, SummaryIndex};
use paperchat_llm::ToolSpec;
use serde::{Deserialize, Serialize};

/// One passage that grounded a tool answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    pub text: String,
    pub page_label: Option<String>,
    pub score: f32,
}

/// Typed result of a tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Answer text produced by the tool
    pub answer: String,

    /// Provenance for the answer, best first. Retrieval populates full
    /// passages; summaries report one page-level entry per source page
    /// (empty text) since they consume the whole document.
    #[serde(default)]
    pub retrieved: Vec<RetrievedPassage>,
}

/// A capability the orchestrator may hand to the model.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name.
    fn name(&self) -> &str;

    /// Descriptor advertised to the model.
    fn spec(&self) -> ToolSpec;

    /// Execute the tool with the model-supplied arguments.
    async fn invoke(&self, args: serde_json::Value) -> AppResult<ToolOutput>;
}

/// Normalize a collection id into an identifier usable in tool names.
///
/// Non-alphanumeric characters become underscores and the result is
/// lowercased, so "Q3 Report.pdf" yields "q3_report_pdf".
pub fn sanitize_collection(collection: &str) -> String {
    let mut out = String::with_capacity(collection.len());
    for c in collection.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else {
            out.push('_');
        }
    }
    out
}

/// Arguments the model passes to the retrieval tool.
#[derive(Debug, Deserialize)]
struct VectorArgs {
    query: String,
    #[serde(default)]
    page_numbers: Option<Vec<String>>,
}

/// Retrieval tool: similarity search with an optional page restriction.
pub struct VectorQueryTool {
    name: String,
    index: Arc<RetrievalIndex>,
}

impl VectorQueryTool {
    pub fn new(collection: &str, index: Arc<RetrievalIndex>) -> Self {
        Self {
            name: format!("vector_tool_{}", sanitize_collection(collection)),
            index,
        }
    }
}

#[async_trait::async_trait]
impl Tool for VectorQueryTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: "Answer specific questions about the document by \
                          retrieving the most relevant passages. Optionally \
                          restrict the search to specific pages."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The question to search the document for"
                    },
                    "page_numbers": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Page labels to restrict the search to. \
                                        Leave empty to search all pages."
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn invoke(&self, args: serde_json::Value) -> AppResult<ToolOutput> {
        let args: VectorArgs = serde_json::from_value(args)
            .map_err(|e| AppError::Turn(format!("Invalid arguments for '{}': {}", self.name, e)))?;

        tracing::debug!(tool = %self.name, query = %args.query, "Invoking retrieval tool");

        let result = self
            .index
            .query(&RetrievalQuery {
                question: args.query,
                page_filter: args.page_numbers.unwrap_or_default(),
            })
            .await?;

        Ok(ToolOutput {
            answer: result.answer,
            retrieved: result
                .retrieved
                .into_iter()
                .map(|scored| RetrievedPassage {
                    text: scored.passage.text,
                    page_label: scored.passage.page_label,
                    score: scored.score,
                })
                .collect(),
        })
    }
}

/// Summary tool: whole-document summarization, no arguments.
pub struct SummaryTool {
    name: String,
    index: Arc<SummaryIndex>,
}

impl SummaryTool {
    pub fn new(collection: &str, index: Arc<SummaryIndex>) -> Self {
        Self {
            name: format!("summary_tool_{}", sanitize_collection(collection)),
            index,
        }
    }
}

#[async_trait::async_trait]
impl Tool for SummaryTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: "Produce a summary of the entire document. Use this \
                          ONLY if the user asks for a summary or overview of \
                          the whole document. Do NOT use it for specific \
                          questions; use the retrieval tool for those."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {}
            }),
        }
    }

    async fn invoke(&self, _args: serde_json::Value) -> AppResult<ToolOutput> {
        tracing::debug!(tool = %self.name, "Invoking summary tool");

        let answer = self
            .index
            .query("a comprehensive overview of the document")
            .await?;

        // A summary is grounded in every source page, so it cites them all
        let retrieved = self
            .index
            .source_pages()
            .into_iter()
            .map(|label| RetrievedPassage {
                text: String::new(),
                page_label: Some(label),
                score: 0.0,
            })
            .collect();

        Ok(ToolOutput { answer, retrieved })
    }
}

/// The tools an agent session exposes, keyed by name.
#[derive(Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Duplicate names are rejected.
    pub fn add(&mut self, tool: Arc<dyn Tool>) -> AppResult<()> {
        let name = tool.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(AppError::Config(format!("Duplicate tool name: '{}'", name)));
        }
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Look a tool up by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.by_name.get(name).map(|&i| &self.tools[i])
    }

    /// Descriptors for every registered tool, in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|t| t.spec()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
