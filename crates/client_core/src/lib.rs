use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use storage::{DocumentStore, MemoryDocumentStore, SqliteDocumentStore};
use tracing::info;

pub mod firestore;
pub mod panel;
pub mod registry;
pub mod screen;
pub mod sync;

pub use firestore::{FirestoreConfig, FirestoreDocumentStore};
pub use panel::{PanelState, SidePanel};
pub use registry::{RegistryEvent, StatusRegistry};
pub use screen::{CourtScreen, PendingWrite, ReconcilePolicy};
pub use sync::RemoteSyncAdapter;

/// Which document store backs the remote sync adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum StoreConfig {
    Memory,
    Sqlite { database_url: String },
    Firestore(FirestoreConfig),
}

pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config {
        StoreConfig::Memory => {
            info!("using in-process document store; statuses are not persisted");
            Arc::new(MemoryDocumentStore::new())
        }
        StoreConfig::Sqlite { database_url } => {
            let store = SqliteDocumentStore::new(database_url).await?;
            store
                .health_check()
                .await
                .with_context(|| format!("document database '{database_url}' is not usable"))?;
            info!(%database_url, "using sqlite document store");
            Arc::new(store)
        }
        StoreConfig::Firestore(firestore) => {
            info!(project = %firestore.project_id, database = %firestore.database, "using firestore document store");
            Arc::new(FirestoreDocumentStore::new(firestore.clone())?)
        }
    };
    Ok(store)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
