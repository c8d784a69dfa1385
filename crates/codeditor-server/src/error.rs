//! Error types for the backend server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use codeditor_core::{EditorError, ExecutorError, LanguageId};
use serde_json::json;
use thiserror::Error;

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request format
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No execution backend wired for the language
    #[error("No execution backend is wired for language '{0}'")]
    UnsupportedLanguage(LanguageId),

    /// Persistence collaborator refused or failed
    #[error("{0}")]
    Persistence(EditorError),

    /// Server configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::InvalidRequest(_) => 400,
            ServerError::UnsupportedLanguage(_) => 422,
            ServerError::Persistence(_) => 502,
            ServerError::Config(_) | ServerError::Internal(_) => 500,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::UnsupportedLanguage(_) => "unsupported_language",
            ServerError::Persistence(_) => "save_failed",
            ServerError::Config(_) => "config_error",
            ServerError::Internal(_) => "internal_error",
        }
    }
}

impl From<ExecutorError> for ServerError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::UnsupportedLanguage(language) => {
                ServerError::UnsupportedLanguage(language)
            }
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error": self.error_type(),
            "details": self.to_string(),
            "timestamp": chrono::Utc::now()
        }));
        (status, body).into_response()
    }
}
