//! Reads and writes court statuses against the remote document store.

use std::{collections::HashMap, sync::Arc};

use serde_json::Value;
use shared::{
    domain::{CourtId, CourtStatus, ScopeId},
    error::SyncError,
    protocol::STATUS_FIELD,
};
use storage::{DocumentStore, StoreError};
use tracing::{error, info};

/// Stateless request/response pair over a document store. Each call is a
/// single round trip with no retry, batching or caching.
#[derive(Clone)]
pub struct RemoteSyncAdapter {
    store: Arc<dyn DocumentStore>,
}

impl RemoteSyncAdapter {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn update_status(
        &self,
        scope: &ScopeId,
        court_id: &CourtId,
        status: CourtStatus,
    ) -> Result<(), SyncError> {
        match self
            .store
            .update_field(
                scope.as_str(),
                court_id.as_str(),
                STATUS_FIELD,
                Value::String(status.as_str().to_string()),
            )
            .await
        {
            Ok(()) => {
                info!(%scope, court = %court_id, %status, "updated court status");
                Ok(())
            }
            Err(err) => {
                error!(%scope, court = %court_id, %status, error = %err, "court status update failed");
                Err(SyncError::StatusUpdateFailed)
            }
        }
    }

    /// Returns document id -> raw `status` value for every court in `scope`.
    /// Any failing document fails the whole call.
    pub async fn fetch_statuses(
        &self,
        scope: &ScopeId,
    ) -> Result<HashMap<CourtId, String>, SyncError> {
        match self.read_statuses(scope).await {
            Ok(statuses) => {
                info!(%scope, courts = statuses.len(), "fetched court statuses");
                Ok(statuses)
            }
            Err(err) => {
                error!(%scope, error = %err, "court status fetch failed");
                Err(SyncError::StatusFetchFailed)
            }
        }
    }

    async fn read_statuses(&self, scope: &ScopeId) -> Result<HashMap<CourtId, String>, StoreError> {
        let documents = self.store.list_documents(scope.as_str()).await?;

        let mut statuses = HashMap::with_capacity(documents.len());
        for document in documents {
            let document = document?;
            let status = document.string_field(STATUS_FIELD).ok_or_else(|| {
                StoreError::Malformed(format!(
                    "document {} has no string '{STATUS_FIELD}' field",
                    document.id
                ))
            })?;
            statuses.insert(CourtId::new(document.id.clone()), status.to_string());
        }
        Ok(statuses)
    }
}

#[cfg(test)]
#[path = "tests/sync_tests.rs"]
mod tests;
