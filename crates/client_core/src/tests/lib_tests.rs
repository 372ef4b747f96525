use serde_json::json;
use shared::domain::{CourtId, CourtLayout, CourtStatus, ScopeId};

use super::*;

#[test]
fn store_config_parses_tagged_backends() {
    let sqlite: StoreConfig = serde_json::from_value(json!({
        "backend": "sqlite",
        "database_url": "sqlite://./data/courts.db",
    }))
    .expect("sqlite config");
    assert_eq!(
        sqlite,
        StoreConfig::Sqlite {
            database_url: "sqlite://./data/courts.db".into()
        }
    );

    let firestore: StoreConfig = serde_json::from_value(json!({
        "backend": "firestore",
        "base_url": "https://firestore.googleapis.com/v1/",
        "project_id": "court-status",
        "database": "(default)",
        "api_key": null,
        "bearer_token": null,
    }))
    .expect("firestore config");
    assert_eq!(firestore, StoreConfig::Firestore(FirestoreConfig::new("court-status")));
}

#[tokio::test]
async fn sqlite_backed_screen_round_trips_a_report() {
    let store = open_store(&StoreConfig::Sqlite {
        database_url: "sqlite::memory:".into(),
    })
    .await
    .expect("open store");

    let screen = CourtScreen::create(
        ScopeId::from("Nic"),
        CourtLayout::default(),
        RemoteSyncAdapter::new(store.clone()),
        ReconcilePolicy::default(),
    );

    // The app never creates court documents, so without seeding the write fails.
    let pending = screen.on_status_change(CourtId::from("Court 1"), CourtStatus::Busy);
    assert!(pending.outcome().await.is_err());
    assert_eq!(
        screen.registry().get(&CourtId::from("Court 1")),
        CourtStatus::Empty
    );
    assert_eq!(screen.hydrate().await, Ok(0));
}

#[tokio::test]
async fn memory_backend_opens_empty() {
    let store = open_store(&StoreConfig::Memory).await.expect("open store");
    let documents = store.list_documents("Nic").await.expect("list");
    assert!(documents.is_empty());
}
