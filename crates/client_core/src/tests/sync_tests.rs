use std::sync::atomic::Ordering;

use serde_json::json;
use storage::MemoryDocumentStore;

use super::*;
use crate::test_support::{court, status_fields, FlakyStore};

fn nic() -> ScopeId {
    ScopeId::from("Nic")
}

#[tokio::test]
async fn update_touches_only_the_target_status_field() {
    let store = Arc::new(MemoryDocumentStore::new());
    let mut court_2 = status_fields("empty");
    court_2.insert("floor".into(), json!("Floor 3"));
    store.insert_document("Nic", "Court 1", status_fields("light")).await;
    store.insert_document("Nic", "Court 2", court_2).await;
    store.insert_document("Bakke", "Court 2", status_fields("empty")).await;

    let adapter = RemoteSyncAdapter::new(store.clone());
    adapter
        .update_status(&nic(), &court("Court 2"), CourtStatus::Busy)
        .await
        .expect("update");

    let updated = store.document("Nic", "Court 2").await.expect("doc");
    assert_eq!(updated.string_field("status"), Some("busy"));
    assert_eq!(updated.fields.get("floor"), Some(&json!("Floor 3")));

    let untouched = store.document("Nic", "Court 1").await.expect("doc");
    assert_eq!(untouched.string_field("status"), Some("light"));
    let other_scope = store.document("Bakke", "Court 2").await.expect("doc");
    assert_eq!(other_scope.string_field("status"), Some("empty"));
}

#[tokio::test]
async fn update_of_missing_document_fails_without_creating_it() {
    let store = Arc::new(MemoryDocumentStore::new());
    store.insert_document("Nic", "Court 1", status_fields("empty")).await;
    let adapter = RemoteSyncAdapter::new(store.clone());

    let err = adapter
        .update_status(&nic(), &court("Court 8"), CourtStatus::Busy)
        .await
        .expect_err("missing document");
    assert_eq!(err, SyncError::StatusUpdateFailed);
    assert!(store.document("Nic", "Court 8").await.is_none());
}

#[tokio::test]
async fn update_surfaces_generic_error_when_store_is_down() {
    let store = FlakyStore::with_courts("Nic", &[("Court 1", "empty")]).await;
    store.set_unavailable(true);
    let adapter = RemoteSyncAdapter::new(store.clone());

    let err = adapter
        .update_status(&nic(), &court("Court 1"), CourtStatus::Light)
        .await
        .expect_err("offline");
    assert_eq!(err, SyncError::StatusUpdateFailed);
    assert_eq!(store.update_calls.load(Ordering::SeqCst), 1, "no retry");
}

#[tokio::test]
async fn fetch_maps_every_document_to_its_status() {
    let store = FlakyStore::with_courts(
        "Nic",
        &[("Court 1", "busy"), ("Court 2", "not-open"), ("Court 3", "mystery")],
    )
    .await;
    let adapter = RemoteSyncAdapter::new(store.clone());

    let statuses = adapter.fetch_statuses(&nic()).await.expect("fetch");
    assert_eq!(
        statuses,
        HashMap::from([
            (court("Court 1"), "busy".to_string()),
            (court("Court 2"), "not-open".to_string()),
            (court("Court 3"), "mystery".to_string()),
        ])
    );
    assert_eq!(store.list_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn fetch_of_empty_scope_is_an_empty_mapping() {
    let adapter = RemoteSyncAdapter::new(Arc::new(MemoryDocumentStore::new()));
    let statuses = adapter
        .fetch_statuses(&ScopeId::from("Bakke"))
        .await
        .expect("fetch");
    assert!(statuses.is_empty());
}

#[tokio::test]
async fn one_unreadable_document_fails_the_whole_fetch() {
    let store =
        FlakyStore::with_courts("Nic", &[("Court 1", "busy"), ("Court 2", "light")]).await;
    store.break_document("Court 2");
    let adapter = RemoteSyncAdapter::new(store);

    assert_eq!(
        adapter.fetch_statuses(&nic()).await,
        Err(SyncError::StatusFetchFailed)
    );
}

#[tokio::test]
async fn document_without_status_field_fails_the_fetch() {
    let store = Arc::new(MemoryDocumentStore::new());
    store.insert_document("Nic", "Court 1", status_fields("busy")).await;
    let mut no_status = storage::Fields::new();
    no_status.insert("status".into(), json!(3));
    store.insert_document("Nic", "Court 2", no_status).await;
    let adapter = RemoteSyncAdapter::new(store);

    assert_eq!(
        adapter.fetch_statuses(&nic()).await,
        Err(SyncError::StatusFetchFailed)
    );
}

#[tokio::test]
async fn fetch_fails_when_store_is_down() {
    let store = FlakyStore::with_courts("Nic", &[("Court 1", "busy")]).await;
    store.set_unavailable(true);
    let adapter = RemoteSyncAdapter::new(store);

    assert_eq!(
        adapter.fetch_statuses(&nic()).await,
        Err(SyncError::StatusFetchFailed)
    );
}
