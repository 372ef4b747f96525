use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::{DocumentRead, DocumentStore, Fields, StoreError, StoredDocument};

/// Process-local document store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<BTreeMap<String, BTreeMap<String, StoredDocument>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces a document wholesale. This is the out-of-band path;
    /// `update_field` never creates documents.
    pub async fn insert_document(&self, collection: &str, document_id: &str, fields: Fields) {
        let mut document = StoredDocument::new(document_id, fields);
        document.updated_at = Some(Utc::now());
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(document_id.to_string(), document);
    }

    pub async fn document(&self, collection: &str, document_id: &str) -> Option<StoredDocument> {
        self.collections
            .read()
            .await
            .get(collection)
            .and_then(|documents| documents.get(document_id))
            .cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentRead>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|documents| documents.values().cloned().map(Ok).collect())
            .unwrap_or_default())
    }

    async fn update_field(
        &self,
        collection: &str,
        document_id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.write().await;
        let document = collections
            .get_mut(collection)
            .and_then(|documents| documents.get_mut(document_id))
            .ok_or_else(|| StoreError::not_found(collection, document_id))?;
        document.fields.insert(field.to_string(), value);
        document.updated_at = Some(Utc::now());
        Ok(())
    }
}
