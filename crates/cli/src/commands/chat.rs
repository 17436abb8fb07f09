//! Interactive chat command.
//!
//! Runs a read/answer loop on stdin. The credential is prompted for when
//! neither flag nor environment supplies one, and `/reset` re-prompts it
//! and invalidates the index cache so the next question rebuilds.

use clap::Args;
use paperchat_agent::Citations;
use paperchat_core::{AppConfig, AppError, AppResult};
use paperchat_index::CacheKey;
use std::io::{BufRead, Write};

use crate::pipeline::{build_session, PipelineCache};

/// Interactive chat with the document
#[derive(Args, Debug)]
pub struct ChatCommand {}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Starting interactive chat");

        let cache = PipelineCache::new();
        let mut credential = resolve_credential(config)?;
        let (mut session, truncated) = build_session(config, &cache, &credential).await?;

        println!("Chatting with: {}", config.document.display());
        println!("Type a question, '/reset' to change the API key, or '/exit' to quit.");
        if truncated {
            println!(
                "Note: only the first {} passages of the document were indexed.",
                config.chunking.max_passages
            );
        }

        let stdin = std::io::stdin();
        let mut lines = stdin.lock().lines();

        loop {
            print!("\nYou: ");
            std::io::stdout().flush().map_err(AppError::Io)?;

            let line = match lines.next() {
                Some(line) => line.map_err(AppError::Io)?,
                None => break,
            };
            let input = line.trim();

            if input.is_empty() {
                continue;
            }

            match input {
                "/exit" | "/quit" => break,
                "/reset" => {
                    cache.invalidate(&CacheKey::new(&config.collection, &credential)).await;

                    let entered = match prompt_credential() {
                        Ok(key) => key,
                        Err(e) => {
                            println!("No key entered ({}); keeping the current session.", e);
                            continue;
                        }
                    };

                    // A failed rebuild keeps the session alive; the user can
                    // '/reset' again with a different key
                    match try_rebuild(config, &cache, &entered).await {
                        Some(rebuilt) => {
                            credential = entered;
                            session = rebuilt;
                            println!("Credential updated, indices rebuilt.");
                        }
                        None => {
                            println!("Use '/reset' to try another key.");
                        }
                    }
                    continue;
                }
                _ => {}
            }

            match session.ask(input).await {
                Ok(report) => {
                    println!("\n{}", report.answer);
                    print_citations(&report.citations);
                }
                Err(e) => {
                    // A failed turn leaves the session usable
                    tracing::warn!("Turn failed: {}", e);
                    println!("\nSorry, that question failed: {}", e);
                }
            }
        }

        println!("Goodbye.");
        Ok(())
    }
}

/// Show the citation banner for one answer.
fn print_citations(citations: &Citations) {
    match citations {
        Citations::Pages(pages) => {
            println!("Sources: page(s) {}", pages.join(", "));
        }
        Citations::Unsupported => {
            println!("Warning: this answer cites no document passages and may be unreliable.");
        }
        Citations::NoInformation => {
            println!("The document does not appear to contain this information.");
        }
    }
}

/// Attempt an index rebuild with a fresh credential.
///
/// Build failures are reported, not propagated, so the chat loop survives
/// a bad key or a broken document and the user can reset again.
async fn try_rebuild(
    config: &AppConfig,
    cache: &PipelineCache,
    credential: &str,
) -> Option<paperchat_agent::SessionContext> {
    match build_session(config, cache, credential).await {
        Ok((session, _)) => Some(session),
        Err(e) => {
            tracing::warn!("Index rebuild failed: {}", e);
            println!("Could not rebuild the indices: {}", e);
            None
        }
    }
}

/// Use the configured key, or prompt when the provider needs one.
fn resolve_credential(config: &AppConfig) -> AppResult<String> {
    if config.provider != "openai" {
        return Ok(config.api_key.clone().unwrap_or_else(|| "local".to_string()));
    }

    match &config.api_key {
        Some(key) => Ok(key.clone()),
        None => prompt_credential(),
    }
}

/// Read an API key from stdin. Prompt goes to stderr so stdout stays clean.
fn prompt_credential() -> AppResult<String> {
    eprint!("OpenAI API key: ");
    std::io::stderr().flush().map_err(AppError::Io)?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line).map_err(AppError::Io)?;

    let key = line.trim().to_string();
    if key.is_empty() {
        return Err(AppError::MissingCredential);
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_credential_prefers_configured_key() {
        let mut config = AppConfig::default();
        config.api_key = Some("sk-configured".to_string());
        assert_eq!(resolve_credential(&config).unwrap(), "sk-configured");
    }

    #[test]
    fn test_resolve_credential_mock_provider_needs_no_key() {
        let mut config = AppConfig::default();
        config.provider = "mock".to_string();
        config.api_key = None;
        assert_eq!(resolve_credential(&config).unwrap(), "local");
    }

    #[tokio::test]
    async fn test_failed_rebuild_is_not_fatal() {
        let mut config = AppConfig::default();
        config.provider = "mock".to_string();
        config.document = std::path::PathBuf::from("no-such-document.pdf");

        let cache = PipelineCache::new();
        // DocumentNotFound inside the build must come back as None,
        // never as a propagated error
        assert!(try_rebuild(&config, &cache, "local").await.is_none());
    }
}
