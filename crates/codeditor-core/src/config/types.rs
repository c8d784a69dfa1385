//! Configuration types for an editor session
//!
//! Every field has a serde default, so an empty YAML document is a valid
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::dispatcher::LogoutPolicy;
use crate::editor::DEFAULT_SNIPPET;
use crate::errors::EditorError;
use crate::persistence::FileDocumentStore;
use crate::registry::{LanguageId, ThemeId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    #[serde(default)]
    pub editor: EditorSettings,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub logout: LogoutConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorSettings {
    #[serde(default)]
    pub default_language: LanguageId,
    #[serde(default)]
    pub default_theme: ThemeId,
    #[serde(default = "default_initial_content")]
    pub initial_content: String,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            default_language: LanguageId::default(),
            default_theme: ThemeId::default(),
            initial_content: default_initial_content(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub backend: ExecutionBackend,
    /// Parent directory for per-run scratch files.
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            backend: ExecutionBackend::default(),
            work_dir: None,
        }
    }
}

/// Execution backends
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ExecutionBackend {
    #[default]
    Native,
    Docker,
    Remote {
        url: String,
    },
    /// No backend: every Run reports an unsupported language.
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PersistenceConfig {
    File {
        #[serde(default = "FileDocumentStore::default_dir")]
        dir: PathBuf,
    },
    Remote {
        url: String,
    },
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        PersistenceConfig::File {
            dir: FileDocumentStore::default_dir(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogoutConfig {
    #[serde(default)]
    pub policy: LogoutPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_initial_content() -> String {
    DEFAULT_SNIPPET.to_string()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl EditorConfig {
    pub fn validate(&self) -> Result<(), EditorError> {
        if self.execution.timeout_ms == 0 {
            return Err(EditorError::ConfigError(
                "execution.timeout_ms must be greater than 0".to_string(),
            ));
        }

        if let ExecutionBackend::Remote { url } = &self.execution.backend {
            if !is_http_url(url) {
                return Err(EditorError::ConfigError(format!(
                    "execution.backend.url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }

        match &self.persistence {
            PersistenceConfig::Remote { url } if !is_http_url(url) => {
                return Err(EditorError::ConfigError(format!(
                    "persistence.url must be an http(s) URL, got '{}'",
                    url
                )));
            }
            PersistenceConfig::File { dir } if dir.as_os_str().is_empty() => {
                return Err(EditorError::ConfigError(
                    "persistence.dir cannot be empty".to_string(),
                ));
            }
            _ => {}
        }

        let level = self.logging.level.to_lowercase();
        if !["error", "warn", "info", "debug", "trace", "off"].contains(&level.as_str()) {
            return Err(EditorError::ConfigError(format!(
                "Unknown logging.level '{}'",
                self.logging.level
            )));
        }

        Ok(())
    }
}
