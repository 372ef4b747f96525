//! Document store boundary: collections of string-keyed documents holding a
//! flat map of JSON fields.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

mod memory;
mod sqlite;

pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Fields,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
            updated_at: None,
        }
    }

    pub fn string_field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }
}

/// Outcome of reading a single document during a collection read.
pub type DocumentRead = Result<StoredDocument, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document {collection}/{document_id} does not exist")]
    NotFound {
        collection: String,
        document_id: String,
    },
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed document data: {0}")]
    Malformed(String),
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn not_found(collection: &str, document_id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            document_id: document_id.to_string(),
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads every document of `collection`. The outer error means the request
    /// as a whole failed; inner errors belong to individual documents.
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentRead>, StoreError>;

    /// Overwrites one field of an existing document. Never creates the
    /// document; a missing document yields `StoreError::NotFound`.
    async fn update_field(
        &self,
        collection: &str,
        document_id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
