//! Configuration loader for YAML files and environment overrides

use std::path::Path;
use std::time::Duration;

use crate::config::types::*;
use crate::errors::EditorError;

pub const TIMEOUT_ENV: &str = "CODEDITOR_EXECUTION_TIMEOUT_MS";
pub const BACKEND_URL_ENV: &str = "CODEDITOR_BACKEND_URL";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<EditorConfig, EditorError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            EditorError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_str(&content)
    }

    /// Like [`ConfigLoader::from_file`], but a missing file yields the defaults.
    pub async fn from_file_or_default<P: AsRef<Path>>(
        path: P,
    ) -> Result<EditorConfig, EditorError> {
        let path = path.as_ref();
        if tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Self::from_file(path).await;
        }
        log::debug!("No config at {}, using defaults", path.display());
        Self::finish(EditorConfig::default())
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<EditorConfig, EditorError> {
        // An empty document parses as null, not as an empty mapping.
        let config: EditorConfig = if content.trim().is_empty() {
            EditorConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| {
                EditorError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?
        };
        Self::finish(config)
    }

    fn finish(mut config: EditorConfig) -> Result<EditorConfig, EditorError> {
        Self::apply_overrides(&mut config, |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides read through `lookup`.
    pub fn apply_overrides<F>(config: &mut EditorConfig, lookup: F) -> Result<(), EditorError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            config.execution.timeout_ms = raw.trim().parse().map_err(|_| {
                EditorError::ConfigError(format!(
                    "{} must be an integer, got '{}'",
                    TIMEOUT_ENV, raw
                ))
            })?;
        }
        if let Some(url) = lookup(BACKEND_URL_ENV) {
            log::debug!("Execution backend overridden by {}", BACKEND_URL_ENV);
            config.execution.backend = ExecutionBackend::Remote { url };
        }
        Ok(())
    }
}

impl ExecutionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
