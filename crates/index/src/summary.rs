//! Summary index: hierarchical tree reduction over the full passage set.
//!
//! Passages are grouped under a character budget, each group is summarized
//! concurrently, and the resulting summaries are reduced recursively until
//! a single document summary remains.

use std::sync::Arc;

use futures::future::try_join_all;
use paperchat_core::AppResult;
use paperchat_llm::{LlmClient, LlmRequest};

use crate::types::PassageSet;

/// Character budget per summarization group.
const DEFAULT_GROUP_CHAR_BUDGET: usize = 6_000;

/// Whole-document summarizer over a fixed passage snapshot.
///
/// Unlike the retrieval index this always consumes every passage, so the
/// cost scales with document length rather than question specificity.
pub struct SummaryIndex {
    passages: PassageSet,
    llm: Arc<dyn LlmClient>,
    model: String,
    group_char_budget: usize,
}

impl SummaryIndex {
    /// Create a summary index over the passage snapshot.
    pub fn new(passages: PassageSet, llm: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            passages,
            llm,
            model: model.into(),
            group_char_budget: DEFAULT_GROUP_CHAR_BUDGET,
        }
    }

    /// Override the per-group character budget.
    pub fn with_group_char_budget(mut self, budget: usize) -> Self {
        self.group_char_budget = budget.max(1);
        self
    }

    /// Distinct page labels of the passages a summary draws on, in
    /// first-appearance order. Every summary consumes the whole snapshot,
    /// so this is the summary's provenance.
    pub fn source_pages(&self) -> Vec<String> {
        let mut pages = Vec::new();
        for passage in self.passages.iter() {
            if let Some(label) = &passage.page_label {
                if !pages.contains(label) {
                    pages.push(label.clone());
                }
            }
        }
        pages
    }

    /// Produce a summary of the whole document.
    ///
    /// Each reduction level summarizes its groups concurrently. The loop
    /// terminates because a level with more than one text always produces
    /// strictly fewer texts than it consumed.
    pub async fn query(&self, focus: &str) -> AppResult<String> {
        tracing::info!(
            "Summarizing {} passages (group budget {} chars)",
            self.passages.len(),
            self.group_char_budget
        );

        let mut texts: Vec<String> = self.passages.iter().map(|p| p.text.clone()).collect();
        let mut level = 0usize;

        loop {
            let groups = self.group_texts(&texts);

            tracing::debug!(level, groups = groups.len(), "Summary reduction level");

            let futures = groups
                .iter()
                .map(|group| self.summarize_group(group, focus, level));
            let mut summaries = try_join_all(futures).await?;

            if summaries.len() == 1 {
                // try_join_all returned exactly one element
                return Ok(summaries.remove(0));
            }

            texts = summaries;
            level += 1;
        }
    }

    /// Pack texts into consecutive groups under the character budget.
    ///
    /// Every group holds at least one text. When the budget is too small to
    /// merge anything, adjacent texts are paired instead so the reduction
    /// still converges.
    fn group_texts(&self, texts: &[String]) -> Vec<Vec<String>> {
        let mut groups: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_chars = 0usize;

        for text in texts {
            let chars = text.chars().count();
            if !current.is_empty() && current_chars + chars > self.group_char_budget {
                groups.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            current.push(text.clone());
            current_chars += chars;
        }
        if !current.is_empty() {
            groups.push(current);
        }

        if groups.len() >= texts.len() && texts.len() > 1 {
            groups = texts.chunks(2).map(|pair| pair.to_vec()).collect();
        }

        groups
    }

    /// Summarize one group of texts in a single LLM call.
    async fn summarize_group(&self, group: &[String], focus: &str, level: usize) -> AppResult<String> {
        let instruction = if level == 0 {
            "Summarize the following excerpts from a document."
        } else {
            "Combine the following partial summaries of a document into one \
             coherent summary. Do not repeat yourself."
        };

        let prompt = format!(
            "{}\nFocus: {}\n\n{}",
            instruction,
            focus,
            group.join("\n\n---\n\n")
        );

        let system = "You summarize documents faithfully. Keep concrete facts, \
                      names, and figures. Do not invent content.";

        let request = LlmRequest::new(prompt, &self.model)
            .with_system(system)
            .with_temperature(0.3);

        let response = self.llm.complete(&request).await?;
        Ok(response.content)
    }
}
