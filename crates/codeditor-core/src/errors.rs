//! Error types for the editor core
//!
//! Validation failures (`InvalidLanguage`, `UnknownLanguage`, `NotAuthenticated`)
//! are returned synchronously to the caller. Execution and persistence failures
//! are produced asynchronously and end up as text in the console pane or the
//! notice slot, never as a process-level failure.

use std::time::Duration;
use thiserror::Error;

use crate::registry::LanguageId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Invalid language: '{0}' is not a supported language")]
    InvalidLanguage(String),
    #[error("Unknown language: '{0}'")]
    UnknownLanguage(String),
    #[error("Not authenticated: an active session is required")]
    NotAuthenticated,
    #[error("Save failed: {0}")]
    SaveFailed(String),
    #[error("Execution backend unavailable: {0}")]
    ExecutionUnavailable(String),
    #[error("Execution timed out after {0} ms")]
    Timeout(u64),
    #[error("No execution backend is wired for language '{0}'")]
    UnsupportedLanguage(LanguageId),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for EditorError {
    fn from(err: std::io::Error) -> Self {
        EditorError::IoError(err.to_string())
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(err: serde_json::Error) -> Self {
        EditorError::SerializationError(err.to_string())
    }
}

// Specific error for execution backends
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Script execution timed out after {0:?}")]
    Timeout(Duration),
    #[error("No backend for language '{0}'")]
    UnsupportedLanguage(LanguageId),
    #[error("Execution was cancelled")]
    Cancelled,
    #[error("I/O error during execution: {0}")]
    IoError(#[from] std::io::Error),
    #[error("HTTP error talking to execution backend: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Bollard (Docker client) error: {0}")]
    BollardError(#[from] bollard::errors::Error),
}

impl From<ExecutorError> for EditorError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::Timeout(limit) => EditorError::Timeout(limit.as_millis() as u64),
            ExecutorError::UnsupportedLanguage(language) => {
                EditorError::UnsupportedLanguage(language)
            }
            other => EditorError::ExecutionUnavailable(other.to_string()),
        }
    }
}

/// Convenience type alias for Results with EditorError
pub type Result<T> = std::result::Result<T, EditorError>;
