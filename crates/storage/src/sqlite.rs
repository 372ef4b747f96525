use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use tracing::debug;

use crate::{DocumentRead, DocumentStore, Fields, StoreError, StoredDocument};

/// Document store persisted in a single SQLite table keyed by
/// `(collection, document_id)`.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: Pool<Sqlite>,
}

impl SqliteDocumentStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // Every connection to `sqlite::memory:` opens its own database.
        let max_connections = if sqlite_path(database_url).is_none() {
            1
        } else {
            5
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open document database '{database_url}'"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Creates a document, replacing its fields if it already exists.
    pub async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        fields: &Fields,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO documents (collection, document_id, fields, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(collection, document_id)
             DO UPDATE SET fields = excluded.fields, updated_at = excluded.updated_at",
        )
        .bind(collection)
        .bind(document_id)
        .bind(serde_json::to_string(fields)?)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to create document {collection}/{document_id}"))?;
        Ok(())
    }

    pub async fn list_collections(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT DISTINCT collection FROM documents ORDER BY collection")
            .fetch_all(&self.pool)
            .await
            .context("failed to list collections")?;
        Ok(rows.into_iter().map(|row| row.get::<String, _>(0)).collect())
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentRead>, StoreError> {
        let rows = sqlx::query(
            "SELECT document_id, fields, updated_at FROM documents
             WHERE collection = ? ORDER BY document_id",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(rows.iter().map(decode_document).collect())
    }

    async fn update_field(
        &self,
        collection: &str,
        document_id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(unavailable)?;

        let row = sqlx::query("SELECT fields FROM documents WHERE collection = ? AND document_id = ?")
            .bind(collection)
            .bind(document_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unavailable)?
            .ok_or_else(|| StoreError::not_found(collection, document_id))?;

        let raw: String = row.try_get("fields").map_err(unavailable)?;
        let mut fields: Fields = serde_json::from_str(&raw).map_err(|err| {
            StoreError::Malformed(format!("{collection}/{document_id}: {err}"))
        })?;
        fields.insert(field.to_string(), value);

        sqlx::query(
            "UPDATE documents SET fields = ?, updated_at = ?
             WHERE collection = ? AND document_id = ?",
        )
        .bind(serde_json::to_string(&fields).context("failed to encode document fields")?)
        .bind(Utc::now().to_rfc3339())
        .bind(collection)
        .bind(document_id)
        .execute(&mut *tx)
        .await
        .map_err(unavailable)?;

        tx.commit().await.map_err(unavailable)?;
        debug!(collection, document_id, field, "sqlite document field updated");
        Ok(())
    }
}

fn decode_document(row: &SqliteRow) -> DocumentRead {
    let id: String = row.try_get("document_id").map_err(unavailable)?;
    let raw: String = row.try_get("fields").map_err(unavailable)?;
    let fields: Fields = serde_json::from_str(&raw)
        .map_err(|err| StoreError::Malformed(format!("document {id}: {err}")))?;
    let updated_at: String = row.try_get("updated_at").map_err(unavailable)?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .ok()
        .map(|ts| ts.with_timezone(&Utc));

    Ok(StoredDocument {
        id,
        fields,
        updated_at,
    })
}

fn unavailable(err: sqlx::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() || path == ":memory:" {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}
