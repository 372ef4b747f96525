use std::collections::HashMap;

use super::*;
use shared::domain::CourtId;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn defaults_target_nic_over_local_sqlite() {
    let settings = load_settings_from(None, env_from(&[])).expect("settings");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.scope, "Nic");
    assert_eq!(settings.reconcile, ReconcilePolicy::RevertOnFailure);
    assert_eq!(settings.layout.court_ids().count(), 5);
}

#[test]
fn file_overrides_scope_store_and_layout() {
    let raw = r#"
        scope = "Bakke"
        reconcile = "keep_diverged"

        [store]
        backend = "firestore"
        project_id = "court-status"

        [[floors]]
        name = "Main floor"
        courts = ["Court A", "Court B"]
    "#;

    let settings = load_settings_from(Some(raw), env_from(&[])).expect("settings");
    assert_eq!(settings.scope, "Bakke");
    assert_eq!(settings.reconcile, ReconcilePolicy::KeepDiverged);
    assert_eq!(
        settings.store,
        StoreConfig::Firestore(FirestoreConfig::new("court-status"))
    );
    let ids: Vec<CourtId> = settings.layout.court_ids().cloned().collect();
    assert_eq!(ids, vec![CourtId::from("Court A"), CourtId::from("Court B")]);
}

#[test]
fn environment_wins_over_file() {
    let raw = r#"
        scope = "Bakke"

        [store]
        backend = "sqlite"
        database_url = "sqlite://./file.db"
    "#;

    let settings = load_settings_from(
        Some(raw),
        env_from(&[
            ("APP__SCOPE", "Nic"),
            ("APP__DATABASE_URL", "sqlite::memory:"),
        ]),
    )
    .expect("settings");
    assert_eq!(settings.scope, "Nic");
    assert_eq!(
        settings.store,
        StoreConfig::Sqlite {
            database_url: "sqlite::memory:".into()
        }
    );
}

#[test]
fn firestore_backend_from_environment_needs_project() {
    let err = load_settings_from(None, env_from(&[("APP__BACKEND", "firestore")]))
        .expect_err("missing project");
    assert!(err.to_string().contains("APP__FIRESTORE_PROJECT"));

    let settings = load_settings_from(
        None,
        env_from(&[
            ("APP__BACKEND", "firestore"),
            ("APP__FIRESTORE_PROJECT", "court-status"),
            ("APP__FIRESTORE_TOKEN", "secret"),
        ]),
    )
    .expect("settings");
    let StoreConfig::Firestore(firestore) = settings.store else {
        panic!("expected firestore backend");
    };
    assert_eq!(firestore.project_id, "court-status");
    assert_eq!(firestore.bearer_token.as_deref(), Some("secret"));
    assert_eq!(firestore.database, "(default)");
}

#[test]
fn rejects_unknown_backend_and_policy() {
    assert!(load_settings_from(None, env_from(&[("APP__BACKEND", "redis")])).is_err());
    assert!(load_settings_from(None, env_from(&[("APP__RECONCILE", "retry")])).is_err());
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let path = std::env::temp_dir().join("courts_config_test_does_not_exist.toml");
    let settings = load_settings(&path).expect("settings");
    assert_eq!(settings.layout, CourtLayout::default());
}
