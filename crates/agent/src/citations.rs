//! Citation extraction from a turn's tool invocation records.
//!
//! Pages come from the typed provenance carried in tool outputs, never
//! from parsing the answer text. The answer text is only consulted by the
//! no-information policy, which decides whether citations should be
//! suppressed entirely.

use crate::orchestrator::ToolInvocation;

/// Default phrases signalling the document does not contain the answer.
const DEFAULT_NO_INFO_PHRASES: &[&str] = &[
    "not mentioned",
    "not available",
    "no information",
    "could not find",
];

/// Default maximum number of pages shown to the user.
const DEFAULT_CITATION_CAP: usize = 5;

/// Citation result for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Citations {
    /// Pages that ground the answer, sorted, capped
    Pages(Vec<String>),

    /// The answer claims information but no retrieval grounded it.
    /// Callers should warn about hallucination risk.
    Unsupported,

    /// The answer states the document does not contain the information
    NoInformation,
}

/// Decides whether an answer amounts to "the document does not say".
pub trait AnswerPolicy: Send + Sync {
    fn is_no_information(&self, answer: &str) -> bool;
}

/// Case-insensitive phrase matching, the default policy.
pub struct PhrasePolicy {
    phrases: Vec<String>,
}

impl PhrasePolicy {
    pub fn new(phrases: Vec<String>) -> Self {
        Self {
            phrases: phrases.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }
}

impl Default for PhrasePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_NO_INFO_PHRASES.iter().map(|s| s.to_string()).collect())
    }
}

impl AnswerPolicy for PhrasePolicy {
    fn is_no_information(&self, answer: &str) -> bool {
        let lower = answer.to_lowercase();
        self.phrases.iter().any(|phrase| lower.contains(phrase))
    }
}

/// Extracts the cited pages for a finished turn.
pub struct CitationExtractor {
    cap: usize,
    policy: Box<dyn AnswerPolicy>,
}

impl CitationExtractor {
    pub fn new() -> Self {
        Self {
            cap: DEFAULT_CITATION_CAP,
            policy: Box::new(PhrasePolicy::default()),
        }
    }

    /// Override the page display cap.
    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap.max(1);
        self
    }

    /// Swap in a different no-information policy.
    pub fn with_policy(mut self, policy: Box<dyn AnswerPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Derive citations from the answer and the turn's invocation records.
    pub fn extract(&self, answer: &str, invocations: &[ToolInvocation]) -> Citations {
        if self.policy.is_no_information(answer) {
            return Citations::NoInformation;
        }

        let mut pages: Vec<String> = invocations
            .iter()
            .flat_map(|inv| inv.output.retrieved.iter())
            .filter_map(|passage| passage.page_label.clone())
            .collect();

        pages.sort();
        pages.dedup();

        if pages.is_empty() {
            return Citations::Unsupported;
        }

        // Numeric order when every label is an integer, lexical otherwise
        let parsed: Option<Vec<u64>> = pages.iter().map(|p| p.parse().ok()).collect();
        if let Some(mut numbers) = parsed {
            numbers.sort_unstable();
            pages = numbers.into_iter().map(|n| n.to_string()).collect();
        }

        pages.truncate(self.cap);
        Citations::Pages(pages)
    }
}

impl Default for CitationExtractor {
    fn default() -> Self {
        Self::new()
    }
}
