//! Configuration management for the paperchat CLI.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables (`PAPERCHAT_*`, `OPENAI_API_KEY`)
//! - Command-line flags
//! - Config file (`paperchat.yaml`)
//!
//! The configuration carries everything the pipeline is parameterized by:
//! the document, chunking bounds, retrieval top-k, and the citation cap.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the PDF document to index
    pub document: PathBuf,

    /// Collection name used to namespace tool names and cache keys
    pub collection: String,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// LLM provider (e.g., "openai")
    pub provider: String,

    /// Chat model identifier
    pub model: String,

    /// Embedding model identifier
    pub embedding_model: String,

    /// Optional custom API endpoint
    pub endpoint: Option<String>,

    /// API key for the LLM provider
    pub api_key: Option<String>,

    /// Chunking parameters
    pub chunking: ChunkingConfig,

    /// Number of passages retrieved per vector query
    pub top_k: usize,

    /// Maximum number of page citations displayed per answer
    pub citation_cap: usize,

    /// Translate questions to the document language before answering
    pub translate: bool,

    /// Language the document is written in (translation target)
    pub document_language: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Chunker/filter parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target passage size in characters
    #[serde(rename = "chunkSize")]
    pub chunk_size: usize,

    /// Overlap between consecutive passages in characters
    #[serde(rename = "chunkOverlap")]
    pub chunk_overlap: usize,

    /// Passages with less trimmed text than this are discarded as noise
    #[serde(rename = "minPassageChars")]
    pub min_passage_chars: usize,

    /// Hard cap on the number of passages kept per document
    #[serde(rename = "maxPassages")]
    pub max_passages: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024,
            chunk_overlap: 100,
            min_passage_chars: 50,
            max_passages: 800,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    document: Option<DocumentConfig>,
    chunking: Option<ChunkingConfig>,
    llm: Option<LlmFileConfig>,
    retrieval: Option<RetrievalConfig>,
    citations: Option<CitationsConfig>,
    translate: Option<TranslateConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DocumentConfig {
    path: Option<String>,
    collection: Option<String>,
    language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmFileConfig {
    provider: Option<String>,
    model: Option<String>,
    #[serde(rename = "embeddingModel")]
    embedding_model: Option<String>,
    endpoint: Option<String>,
    #[serde(rename = "apiKeyEnv")]
    api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RetrievalConfig {
    #[serde(rename = "topK")]
    top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CitationsConfig {
    #[serde(rename = "maxDisplay")]
    max_display: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TranslateConfig {
    enabled: Option<bool>,
    target: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            document: PathBuf::from("document.pdf"),
            collection: "document".to_string(),
            config_file: None,
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            endpoint: None,
            api_key: None,
            chunking: ChunkingConfig::default(),
            top_k: 3,
            citation_cap: 5,
            translate: false,
            document_language: "English".to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and defaults.
    ///
    /// Environment variables:
    /// - `PAPERCHAT_DOCUMENT`: Path to the PDF
    /// - `PAPERCHAT_COLLECTION`: Collection name
    /// - `PAPERCHAT_CONFIG`: Path to config file
    /// - `PAPERCHAT_PROVIDER`: LLM provider
    /// - `PAPERCHAT_MODEL`: Chat model identifier
    /// - `OPENAI_API_KEY`: API key (also `PAPERCHAT_API_KEY`)
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    pub fn load() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(document) = std::env::var("PAPERCHAT_DOCUMENT") {
            config.document = PathBuf::from(document);
        }

        if let Ok(collection) = std::env::var("PAPERCHAT_COLLECTION") {
            config.collection = collection;
        }

        if let Ok(config_file) = std::env::var("PAPERCHAT_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        // Load from YAML config file if it exists
        let config_path = if let Some(ref cf) = config.config_file {
            cf.clone()
        } else {
            PathBuf::from("paperchat.yaml")
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("PAPERCHAT_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("PAPERCHAT_MODEL") {
            config.model = model;
        }

        config.api_key = std::env::var("PAPERCHAT_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());
        config.log_level = std::env::var("RUST_LOG").ok();

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &PathBuf) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(doc) = config_file.document {
            if let Some(path) = doc.path {
                result.document = PathBuf::from(path);
            }
            if let Some(collection) = doc.collection {
                result.collection = collection;
            }
            if let Some(language) = doc.language {
                result.document_language = language;
            }
        }

        if let Some(chunking) = config_file.chunking {
            result.chunking = chunking;
        }

        if let Some(llm) = config_file.llm {
            if let Some(provider) = llm.provider {
                result.provider = provider;
            }
            if let Some(model) = llm.model {
                result.model = model;
            }
            if let Some(embedding_model) = llm.embedding_model {
                result.embedding_model = embedding_model;
            }
            if let Some(endpoint) = llm.endpoint {
                result.endpoint = Some(endpoint);
            }
            if let Some(api_key_env) = llm.api_key_env {
                if let Ok(key) = std::env::var(&api_key_env) {
                    result.api_key = Some(key);
                }
            }
        }

        if let Some(retrieval) = config_file.retrieval {
            if let Some(top_k) = retrieval.top_k {
                result.top_k = top_k;
            }
        }

        if let Some(citations) = config_file.citations {
            if let Some(max_display) = citations.max_display {
                result.citation_cap = max_display;
            }
        }

        if let Some(translate) = config_file.translate {
            if let Some(enabled) = translate.enabled {
                result.translate = enabled;
            }
            if let Some(target) = translate.target {
                result.document_language = target;
            }
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// CLI flags take precedence over environment variables and the
    /// config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        document: Option<PathBuf>,
        collection: Option<String>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(document) = document {
            self.document = document;
        }

        if let Some(collection) = collection {
            self.collection = collection;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Validate configuration bounds before any index is built.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(AppError::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }

        if self.chunking.max_passages == 0 {
            return Err(AppError::Config(
                "maxPassages must be at least 1".to_string(),
            ));
        }

        if self.top_k == 0 {
            return Err(AppError::Config("topK must be at least 1".to_string()));
        }

        let known_providers = ["openai", "mock"];
        if !known_providers.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                known_providers.join(", ")
            )));
        }

        Ok(())
    }
}
