use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::{DocumentStore, SaveRequest, StoredDocument};
use crate::errors::{EditorError, Result};

/// One JSON record per session under a directory. Saves for the same
/// session are applied one at a time, in arrival order.
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    dir: PathBuf,
    record_locks: Arc<Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>>,
}

impl FileDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            record_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// `<data dir>/codeditor/documents`, or a relative fallback when the
    /// platform has no data dir.
    pub fn default_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("codeditor")
            .join("documents")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, session_id: &str) -> PathBuf {
        let file_stem: String = session_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", file_stem))
    }

    /// Keyed by record path, since distinct ids can sanitize to the same file.
    fn record_lock(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .record_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(path.to_path_buf()).or_default().clone()
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn save(&self, request: &SaveRequest) -> Result<()> {
        if request.session_id.is_empty() {
            return Err(EditorError::SaveFailed("empty session id".to_string()));
        }
        tokio::fs::create_dir_all(&self.dir).await?;

        let record = StoredDocument::from_request(request);
        let serialized = serde_json::to_vec_pretty(&record)?;

        let path = self.record_path(&request.session_id);
        let lock = self.record_lock(&path);
        let _guard = lock.lock().await;

        // Write then rename so readers never see a half-written record.
        let tmp_path = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
        tokio::fs::write(&tmp_path, serialized).await?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(e.into());
        }

        log::info!(
            "Saved {} document ({} bytes) to {}",
            request.language,
            request.content.len(),
            path.display()
        );
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<StoredDocument>> {
        let path = self.record_path(session_id);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_slice(&data)?))
    }
}
