use async_trait::async_trait;
use std::time::Duration;

use super::{DocumentStore, SaveRequest, SaveResponse};
use crate::errors::{EditorError, Result};

/// Persists through `POST <url>/documents`.
pub struct RemoteDocumentStore {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl RemoteDocumentStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl DocumentStore for RemoteDocumentStore {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn save(&self, request: &SaveRequest) -> Result<()> {
        let documents_url = format!("{}/documents", self.base_url);
        let response = self
            .client
            .post(&documents_url)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| EditorError::SaveFailed(e.to_string()))?;

        let status = response.status();
        match response.json::<SaveResponse>().await {
            Ok(SaveResponse { ok: true, .. }) => Ok(()),
            Ok(SaveResponse { error, .. }) => Err(EditorError::SaveFailed(
                error.unwrap_or_else(|| format!("rejected with status {}", status)),
            )),
            Err(_) => Err(EditorError::SaveFailed(format!(
                "unexpected response from {}: {}",
                documents_url, status
            ))),
        }
    }
}
