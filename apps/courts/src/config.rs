use std::{fs, path::Path};

use anyhow::{bail, Context};
use client_core::{FirestoreConfig, ReconcilePolicy, StoreConfig};
use serde::Deserialize;
use shared::domain::{CourtLayout, Floor};

pub const DEFAULT_CONFIG_PATH: &str = "courts.toml";
const DEFAULT_DATABASE_URL: &str = "sqlite://./data/courts.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub scope: String,
    pub store: StoreConfig,
    pub reconcile: ReconcilePolicy,
    pub layout: CourtLayout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scope: "Nic".into(),
            store: StoreConfig::Sqlite {
                database_url: DEFAULT_DATABASE_URL.into(),
            },
            reconcile: ReconcilePolicy::default(),
            layout: CourtLayout::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    scope: Option<String>,
    store: Option<StoreConfig>,
    reconcile: Option<ReconcilePolicy>,
    #[serde(default)]
    floors: Vec<Floor>,
}

/// Defaults, then `path` (if it exists), then `APP__*` environment variables.
pub fn load_settings(path: &Path) -> anyhow::Result<Settings> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    load_settings_from(raw.as_deref(), |key| std::env::var(key).ok())
}

pub fn load_settings_from<E>(file: Option<&str>, env: E) -> anyhow::Result<Settings>
where
    E: Fn(&str) -> Option<String>,
{
    let mut settings = Settings::default();

    if let Some(raw) = file {
        let file_cfg: FileSettings = toml::from_str(raw).context("invalid courts config file")?;
        if let Some(scope) = file_cfg.scope {
            settings.scope = scope;
        }
        if let Some(store) = file_cfg.store {
            settings.store = store;
        }
        if let Some(reconcile) = file_cfg.reconcile {
            settings.reconcile = reconcile;
        }
        if !file_cfg.floors.is_empty() {
            settings.layout = CourtLayout {
                floors: file_cfg.floors,
            };
        }
    }

    if let Some(v) = env("APP__SCOPE") {
        settings.scope = v;
    }

    if let Some(v) = env("APP__RECONCILE") {
        settings.reconcile = match v.as_str() {
            "keep_diverged" => ReconcilePolicy::KeepDiverged,
            "revert_on_failure" => ReconcilePolicy::RevertOnFailure,
            other => bail!("unknown APP__RECONCILE value '{other}'"),
        };
    }

    if let Some(v) = env("APP__BACKEND") {
        settings.store = match v.as_str() {
            "memory" => StoreConfig::Memory,
            "sqlite" => StoreConfig::Sqlite {
                database_url: DEFAULT_DATABASE_URL.into(),
            },
            "firestore" => {
                let project_id = env("APP__FIRESTORE_PROJECT")
                    .context("APP__FIRESTORE_PROJECT is required for the firestore backend")?;
                StoreConfig::Firestore(FirestoreConfig::new(project_id))
            }
            other => bail!("unknown APP__BACKEND value '{other}'"),
        };
    }

    match &mut settings.store {
        StoreConfig::Sqlite { database_url } => {
            if let Some(v) = env("DATABASE_URL") {
                *database_url = v;
            }
            if let Some(v) = env("APP__DATABASE_URL") {
                *database_url = v;
            }
        }
        StoreConfig::Firestore(firestore) => {
            if let Some(v) = env("APP__FIRESTORE_BASE_URL") {
                firestore.base_url = v;
            }
            if let Some(v) = env("APP__FIRESTORE_API_KEY") {
                firestore.api_key = Some(v);
            }
            if let Some(v) = env("APP__FIRESTORE_TOKEN") {
                firestore.bearer_token = Some(v);
            }
        }
        StoreConfig::Memory => {}
    }

    if settings.layout.floors.iter().all(|floor| floor.courts.is_empty()) {
        bail!("court layout lists no courts");
    }

    Ok(settings)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
