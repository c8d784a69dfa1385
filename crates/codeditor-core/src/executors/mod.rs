//! Code execution backends and the channel that drives them.
//!
//! A backend turns `(source, language)` into captured output. Backends run
//! programs through local toolchains, inside Docker containers, or on a remote
//! HTTP service. The [`ExecutionChannel`] picks a backend per language and
//! enforces the wall-clock timeout. Dropping its future cancels the run.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::{EditorError, ExecutorError};
use crate::registry::LanguageId;

pub mod channel;
pub mod docker;
pub mod native;
pub mod remote;
pub mod router;

pub use channel::ExecutionChannel;
pub use router::ExecutorRouter;

/// Exit status reported when the channel gives up on a run.
pub const EXIT_TIMEOUT: i32 = 124;
/// Exit status reported when no backend is wired for the language.
pub const EXIT_UNSUPPORTED: i32 = 126;
/// Exit status reported when the backend cannot be reached.
pub const EXIT_UNAVAILABLE: i32 = 127;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub content: String,
    pub language: LanguageId,
}

impl ExecutionRequest {
    pub fn new(content: &str, language: LanguageId) -> Self {
        Self {
            content: content.to_string(),
            language,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_status: i32,
    pub duration_ms: u64,
}

impl ExecutionResult {
    pub fn success(stdout: &str) -> Self {
        Self {
            stdout: stdout.to_string(),
            stderr: String::new(),
            exit_status: 0,
            duration_ms: 0,
        }
    }

    /// Synthetic result standing in for a run the backend could not complete.
    pub fn from_failure(err: &EditorError, duration_ms: u64) -> Self {
        let exit_status = match err {
            EditorError::Timeout(_) => EXIT_TIMEOUT,
            EditorError::UnsupportedLanguage(_) => EXIT_UNSUPPORTED,
            _ => EXIT_UNAVAILABLE,
        };
        Self {
            stdout: String::new(),
            stderr: err.to_string(),
            exit_status,
            duration_ms,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_status == 0
    }

    /// Console pane rendering: captured streams followed by a status footer.
    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.stdout);
        if !self.stderr.is_empty() {
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push_str(&self.stderr);
        }
        if !out.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!(
            "> [exit status {} in {} ms]",
            self.exit_status, self.duration_ms
        ));
        out
    }
}

#[async_trait]
pub trait CodeExecutor: Send + Sync {
    fn name(&self) -> &'static str;

    async fn execute_code(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult, ExecutorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let request = ExecutionRequest::new("print('hi')", LanguageId::Python);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"content": "print('hi')", "language": "python"})
        );

        let result: ExecutionResult = serde_json::from_str(
            r#"{"stdout":"hi\n","stderr":"","exitStatus":0,"durationMs":12}"#,
        )
        .unwrap();
        assert_eq!(result.stdout, "hi\n");
        assert_eq!(result.duration_ms, 12);
        assert!(result.succeeded());
    }

    #[test]
    fn test_failure_results_are_non_zero() {
        let timeout = ExecutionResult::from_failure(&EditorError::Timeout(5000), 5000);
        assert_eq!(timeout.exit_status, EXIT_TIMEOUT);
        assert!(timeout.stderr.contains("timed out"));

        let unsupported = ExecutionResult::from_failure(
            &EditorError::UnsupportedLanguage(LanguageId::Css),
            0,
        );
        assert_eq!(unsupported.exit_status, EXIT_UNSUPPORTED);

        let unavailable = ExecutionResult::from_failure(
            &EditorError::ExecutionUnavailable("connection refused".to_string()),
            3,
        );
        assert_eq!(unavailable.exit_status, EXIT_UNAVAILABLE);
        assert!(!unavailable.succeeded());
    }

    #[test]
    fn test_render() {
        let result = ExecutionResult {
            stdout: "hi\n".to_string(),
            stderr: "warn".to_string(),
            exit_status: 1,
            duration_ms: 7,
        };
        assert_eq!(result.render(), "hi\nwarn\n> [exit status 1 in 7 ms]");
    }
}
