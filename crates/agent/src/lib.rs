//! Agent layer: exposes document indices as LLM tools and drives the
//! function-calling loop that answers questions with cited sources.

pub mod citations;
pub mod orchestrator;
pub mod session;
pub mod tools;
pub mod translate;

pub use citations::{AnswerPolicy, CitationExtractor, Citations, PhrasePolicy};
pub use orchestrator::{Orchestrator, ToolInvocation, TurnOutcome};
pub use session::{ConversationTurn, SessionContext, TurnReport};
pub use tools::{
    sanitize_collection, RetrievedPassage, SummaryTool, Tool, ToolOutput, ToolSet, VectorQueryTool,
};
pub use translate::Translator;
