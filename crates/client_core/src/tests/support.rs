use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use serde_json::{json, Value};
use shared::domain::CourtId;
use storage::{DocumentRead, DocumentStore, Fields, MemoryDocumentStore, StoreError};
use tokio::sync::Semaphore;

/// Memory store with switchable failures and an optional gate holding back
/// writes until the test releases them.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryDocumentStore,
    broken_documents: Mutex<HashSet<String>>,
    unavailable: AtomicBool,
    write_gate: Mutex<Option<Arc<Semaphore>>>,
    pub update_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
}

impl FlakyStore {
    pub async fn with_courts(collection: &str, courts: &[(&str, &str)]) -> Arc<Self> {
        let store = Self::default();
        for (court, status) in courts {
            store
                .inner
                .insert_document(collection, court, status_fields(status))
                .await;
        }
        Arc::new(store)
    }

    pub fn break_document(&self, document_id: &str) {
        self.broken_documents
            .lock()
            .expect("lock")
            .insert(document_id.to_string());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Holds every following write until `release_writes` is called.
    pub fn hold_writes(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.write_gate.lock().expect("lock") = Some(gate.clone());
        gate
    }

    pub async fn status_of(&self, collection: &str, court: &str) -> Option<String> {
        self.inner
            .document(collection, court)
            .await
            .and_then(|doc| doc.string_field("status").map(str::to_string))
    }
}

pub fn status_fields(status: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert("status".into(), json!(status));
    fields
}

pub fn court(id: &str) -> CourtId {
    CourtId::from(id)
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentRead>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("offline".into()));
        }
        let broken = self.broken_documents.lock().expect("lock").clone();
        let documents = self.inner.list_documents(collection).await?;
        Ok(documents
            .into_iter()
            .map(|read| match read {
                Ok(doc) if broken.contains(&doc.id) => {
                    Err(StoreError::Malformed(format!("{} unreadable", doc.id)))
                }
                other => other,
            })
            .collect())
    }

    async fn update_field(
        &self,
        collection: &str,
        document_id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.write_gate.lock().expect("lock").clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate open").forget();
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("offline".into()));
        }
        self.inner
            .update_field(collection, document_id, field, value)
            .await
    }
}
