//! Paperchat CLI
//!
//! Main entry point for the paperchat command-line tool.
//! Chat with a single PDF document: retrieval-grounded answers with
//! cited source pages.

mod commands;
mod pipeline;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand};
use paperchat_core::{config::AppConfig, logging};
use std::path::PathBuf;

/// Paperchat CLI - ask questions about one PDF document
#[derive(Parser, Debug)]
#[command(name = "paperchat")]
#[command(about = "Chat with a single PDF document", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the PDF document
    #[arg(short, long, global = true, env = "PAPERCHAT_DOCUMENT")]
    document: Option<PathBuf>,

    /// Collection name (namespaces tool names and the index cache)
    #[arg(long, global = true, env = "PAPERCHAT_COLLECTION")]
    collection: Option<String>,

    /// Path to config file
    #[arg(short, long, global = true, env = "PAPERCHAT_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (openai, mock)
    #[arg(short, long, global = true, env = "PAPERCHAT_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "PAPERCHAT_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive chat with the document
    Chat(ChatCommand),

    /// Ask a single question and exit
    Ask(AskCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment and config file
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.document,
        cli.collection,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Paperchat CLI starting");
    tracing::debug!("Document: {:?}", config.document);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    // Fail early on nonsensical bounds
    config.validate()?;

    let command_name = match &cli.command {
        Commands::Chat(_) => "chat",
        Commands::Ask(_) => "ask",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result?;
    Ok(())
}
