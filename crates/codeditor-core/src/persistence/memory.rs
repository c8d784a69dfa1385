use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{DocumentStore, SaveRequest, StoredDocument};
use crate::errors::{EditorError, Result};

/// Keeps documents in memory. Can be told to fail or to stall, for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocumentStore {
    documents: Arc<RwLock<HashMap<String, StoredDocument>>>,
    requests: Arc<RwLock<Vec<SaveRequest>>>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every save request received, in arrival order.
    pub async fn requests(&self) -> Vec<SaveRequest> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn save(&self, request: &SaveRequest) -> Result<()> {
        self.requests.write().await.push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.failure {
            return Err(EditorError::SaveFailed(message.clone()));
        }
        self.documents.write().await.insert(
            request.session_id.clone(),
            StoredDocument::from_request(request),
        );
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<StoredDocument>> {
        Ok(self.documents.read().await.get(session_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::LanguageId;

    #[tokio::test]
    async fn test_failing_store_records_request() {
        let store = MemoryDocumentStore::failing("quota exceeded");
        let request = SaveRequest {
            content: "x".to_string(),
            language: LanguageId::Css,
            session_id: "s".to_string(),
        };
        let err = store.save(&request).await.unwrap_err();
        assert_eq!(err, EditorError::SaveFailed("quota exceeded".to_string()));
        assert_eq!(store.requests().await.len(), 1);
        assert!(store.load("s").await.unwrap().is_none());
    }
}
