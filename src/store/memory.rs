//! In-memory document store

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

use super::{Collection, DocumentStore};
use crate::types::{AdminError, Result};

/// Store that keeps documents in a map; unseeded collections fail to load
/// the way a missing file does.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<Collection, Value>>,
    saves: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with the given documents
    pub fn with_documents(documents: impl IntoIterator<Item = (Collection, Value)>) -> Self {
        Self {
            documents: RwLock::new(documents.into_iter().collect()),
            saves: AtomicUsize::new(0),
        }
    }

    /// Number of `save` calls so far
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load(&self, collection: Collection) -> Result<Value> {
        self.documents
            .read()
            .await
            .get(&collection)
            .cloned()
            .ok_or_else(|| AdminError::Storage(format!("{collection} document missing")))
    }

    async fn save(&self, collection: Collection, document: &Value) -> Result<()> {
        self.documents
            .write()
            .await
            .insert(collection, document.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unseeded_collection_fails() {
        let store = MemoryDocumentStore::new();
        assert!(matches!(
            store.load(Collection::Phases).await,
            Err(AdminError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_seeded_and_saved() {
        let store = MemoryDocumentStore::with_documents([(Collection::Closings, json!({}))]);
        assert_eq!(store.load(Collection::Closings).await.unwrap(), json!({}));

        store
            .save(Collection::Closings, &json!({"emma": {"encouragement": "hi"}}))
            .await
            .unwrap();
        assert_eq!(
            store.load(Collection::Closings).await.unwrap()["emma"]["encouragement"],
            "hi"
        );
        assert_eq!(store.save_count(), 1);
    }
}
