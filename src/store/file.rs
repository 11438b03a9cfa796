//! JSON files in a data directory
//!
//! Writes go to a sibling temp file which is then renamed over the target,
//! so a reader never sees a half-written document.

use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

use super::{Collection, DocumentStore};
use crate::types::{AdminError, Result};

/// Store backed by one JSON file per collection
#[derive(Debug, Clone)]
pub struct FileDocumentStore {
    data_dir: PathBuf,
}

impl FileDocumentStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Full path of a collection's file
    pub fn path_for(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.file_name())
    }
}

#[async_trait]
impl DocumentStore for FileDocumentStore {
    async fn load(&self, collection: Collection) -> Result<Value> {
        let path = self.path_for(collection);
        let raw = tokio::fs::read(&path).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to read document");
            AdminError::Storage(format!("{}: {e}", path.display()))
        })?;

        serde_json::from_slice(&raw).map_err(|e| {
            error!(path = %path.display(), error = %e, "Document is not valid JSON");
            AdminError::Storage(format!("{}: {e}", path.display()))
        })
    }

    async fn save(&self, collection: Collection, document: &Value) -> Result<()> {
        let path = self.path_for(collection);
        let content = serde_json::to_string_pretty(document)
            .map_err(|e| AdminError::Internal(format!("Failed to serialize {collection}: {e}")))?;

        atomic_write(&path, &content).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to write document");
            AdminError::Storage(format!("{}: {e}", path.display()))
        })?;

        debug!(path = %path.display(), bytes = content.len(), "Document saved");
        Ok(())
    }
}

async fn atomic_write(path: &Path, content: &str) -> std::io::Result<()> {
    let tmp_path = path.with_extension(format!("json.tmp.{}", std::process::id()));
    tokio::fs::write(&tmp_path, content.as_bytes()).await?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    Ok(())
}
