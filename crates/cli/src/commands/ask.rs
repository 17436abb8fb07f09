//! One-shot ask command.
//!
//! Builds the indices, answers a single question, prints the answer with
//! its citation line, and exits. Unlike `chat` this never prompts: a
//! missing credential is an error.

use clap::Args;
use paperchat_agent::Citations;
use paperchat_core::{AppConfig, AppError, AppResult};

use crate::pipeline::{build_session, PipelineCache};

/// Ask a single question and exit
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask about the document
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing one-shot ask");

        let credential = if config.provider == "openai" {
            config.api_key.clone().ok_or(AppError::MissingCredential)?
        } else {
            config.api_key.clone().unwrap_or_else(|| "local".to_string())
        };

        let cache = PipelineCache::new();
        let (mut session, truncated) = build_session(config, &cache, &credential).await?;

        if truncated && !self.json {
            eprintln!(
                "Note: only the first {} passages of the document were indexed.",
                config.chunking.max_passages
            );
        }

        let report = session.ask(&self.question).await?;

        if self.json {
            let (kind, pages) = match &report.citations {
                Citations::Pages(pages) => ("pages", pages.clone()),
                Citations::Unsupported => ("unsupported", Vec::new()),
                Citations::NoInformation => ("noInformation", Vec::new()),
            };

            let output = serde_json::json!({
                "question": self.question,
                "answer": report.answer,
                "citations": {
                    "kind": kind,
                    "pages": pages,
                },
                "truncated": truncated,
            });

            let json = serde_json::to_string_pretty(&output)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            println!("{}", report.answer);
            match &report.citations {
                Citations::Pages(pages) => println!("Sources: page(s) {}", pages.join(", ")),
                Citations::Unsupported => println!(
                    "Warning: this answer cites no document passages and may be unreliable."
                ),
                Citations::NoInformation => {
                    println!("The document does not appear to contain this information.")
                }
            }
        }

        Ok(())
    }
}
