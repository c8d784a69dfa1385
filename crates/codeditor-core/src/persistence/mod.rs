//! Persistence collaborators for Save.
//!
//! A store receives `{content, language, sessionId}` and either accepts it or
//! reports why not. Stores never touch editor state; the dispatcher applies the
//! outcome to the surface.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::registry::LanguageId;

pub mod file;
pub mod memory;
pub mod remote;

pub use file::FileDocumentStore;
pub use memory::MemoryDocumentStore;
pub use remote::RemoteDocumentStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveRequest {
    pub content: String,
    pub language: LanguageId,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn failed(error: &str) -> Self {
        Self {
            ok: false,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDocument {
    pub session_id: String,
    pub content: String,
    pub language: LanguageId,
    pub saved_at: DateTime<Utc>,
}

impl StoredDocument {
    pub fn from_request(request: &SaveRequest) -> Self {
        Self {
            session_id: request.session_id.clone(),
            content: request.content.clone(),
            language: request.language,
            saved_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &'static str;

    async fn save(&self, request: &SaveRequest) -> Result<()>;

    /// Last document saved under `session_id`, for stores that can read back.
    async fn load(&self, _session_id: &str) -> Result<Option<StoredDocument>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shapes() {
        let request = SaveRequest {
            content: "x".to_string(),
            language: LanguageId::Json,
            session_id: "s-1".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"content": "x", "language": "json", "sessionId": "s-1"})
        );

        assert_eq!(
            serde_json::to_string(&SaveResponse::ok()).unwrap(),
            r#"{"ok":true}"#
        );
        let failed: SaveResponse =
            serde_json::from_str(r#"{"ok":false,"error":"quota exceeded"}"#).unwrap();
        assert_eq!(failed, SaveResponse::failed("quota exceeded"));
    }
}
