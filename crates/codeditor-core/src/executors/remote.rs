use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;

use super::{CodeExecutor, ExecutionRequest, ExecutionResult};
use crate::errors::ExecutorError;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Execution backend reached over HTTP (`POST <url>/execute`).
pub struct HttpCodeExecutor {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpCodeExecutor {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Transport-level timeout. The channel's execution budget still applies on top.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health_check(&self) -> Result<(), ExecutorError> {
        let health_url = format!("{}/health", self.base_url);
        let response = self
            .client
            .get(&health_url)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ExecutorError::Unavailable(format!(
                "Health check failed: {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CodeExecutor for HttpCodeExecutor {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn execute_code(
        &self,
        request: &ExecutionRequest,
    ) -> Result<ExecutionResult, ExecutorError> {
        let execute_url = format!("{}/execute", self.base_url);
        let response = self
            .client
            .post(&execute_url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| ExecutorError::Unavailable(format!("{}: {}", execute_url, e)))?;

        let status = response.status();
        if status == StatusCode::UNPROCESSABLE_ENTITY {
            let body: Option<ErrorBody> = response.json().await.ok();
            if body.is_some_and(|b| b.error == "unsupported_language") {
                return Err(ExecutorError::UnsupportedLanguage(request.language));
            }
            return Err(ExecutorError::Unavailable(format!(
                "Execution endpoint rejected the request: {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(ExecutorError::Unavailable(format!(
                "Execution endpoint returned {}",
                status
            )));
        }

        Ok(response.json::<ExecutionResult>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::LanguageId;

    #[test]
    fn test_base_url_is_normalized() {
        let executor = HttpCodeExecutor::new("http://localhost:3000/");
        assert_eq!(executor.base_url(), "http://localhost:3000");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable() {
        // Port 9 (discard) is closed on test hosts.
        let executor =
            HttpCodeExecutor::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2));
        let err = executor
            .execute_code(&ExecutionRequest::new("print(1)", LanguageId::Python))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutorError::Unavailable(_)));
    }
}
