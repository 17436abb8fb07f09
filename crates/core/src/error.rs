//! Error types for the paperchat CLI.
//!
//! This module defines a unified error enum covering all error categories
//! in the application: credentials, document loading, index construction,
//! LLM calls, translation, and per-turn agent failures.

use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for the paperchat CLI.
///
/// All functions in the application return `Result<T, AppError>`.
/// Errors are represented and propagated, never panicked on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No API credential available from flags, environment, or prompt
    #[error("No API credential provided")]
    MissingCredential,

    /// The input document does not exist
    #[error("Document not found: {}", .0.display())]
    DocumentNotFound(PathBuf),

    /// The document produced no passages above the noise threshold
    #[error("Document yielded no usable passages")]
    EmptyDocument,

    /// Index construction failed (wraps loader/embedding/LLM causes)
    #[error("Index build failed: {0}")]
    IndexBuild(String),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Question translation failed (recoverable: caller falls back)
    #[error("Translation failed: {0}")]
    Translation(String),

    /// A question/answer turn failed; the session stays usable
    #[error("Turn failed: {0}")]
    Turn(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
