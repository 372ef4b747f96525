//! `DocumentStore` over the Firestore REST v1 document API.

use std::fmt;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use storage::{DocumentRead, DocumentStore, Fields, StoreError, StoredDocument};
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com/v1/";
pub const DEFAULT_DATABASE: &str = "(default)";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirestoreConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub project_id: String,
    #[serde(default = "default_database")]
    pub database: String,
    pub api_key: Option<String>,
    pub bearer_token: Option<String>,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            api_key: None,
            bearer_token: None,
        }
    }
}

impl fmt::Debug for FirestoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("FirestoreConfig")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("api_key", &redacted(&self.api_key))
            .field("bearer_token", &redacted(&self.bearer_token))
            .finish()
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

#[derive(Debug, Deserialize)]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    #[serde(default, rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default, rename = "updateTime")]
    update_time: Option<DateTime<Utc>>,
}

pub struct FirestoreDocumentStore {
    client: Client,
    config: FirestoreConfig,
    documents_root: Url,
}

impl FirestoreDocumentStore {
    pub fn new(config: FirestoreConfig) -> anyhow::Result<Self> {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: FirestoreConfig) -> anyhow::Result<Self> {
        let mut base_url = config.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let mut documents_root = Url::parse(&base_url)
            .with_context(|| format!("invalid firestore base url '{}'", config.base_url))?;
        documents_root
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("firestore base url cannot be a base: {base_url}"))?
            .pop_if_empty()
            .extend([
                "projects",
                config.project_id.as_str(),
                "databases",
                config.database.as_str(),
                "documents",
            ]);

        Ok(Self {
            client,
            config,
            documents_root,
        })
    }

    fn document_url(&self, segments: &[&str]) -> Url {
        let mut url = self.documents_root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        if let Some(api_key) = &self.config.api_key {
            url.query_pairs_mut().append_pair("key", api_key);
        }
        url
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocumentStore {
    async fn list_documents(&self, collection: &str) -> Result<Vec<DocumentRead>, StoreError> {
        let url = self.document_url(&[collection]);
        debug!(%url, "listing firestore documents");
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response, collection, None).await?;
        let body: ListDocumentsResponse = response
            .json()
            .await
            .map_err(|err| StoreError::Malformed(err.to_string()))?;

        if body.next_page_token.is_some() {
            return Err(StoreError::Malformed(format!(
                "collection {collection} does not fit in a single page"
            )));
        }

        Ok(body.documents.into_iter().map(decode_document).collect())
    }

    async fn update_field(
        &self,
        collection: &str,
        document_id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let mut url = self.document_url(&[collection, document_id]);
        url.query_pairs_mut()
            .append_pair("updateMask.fieldPaths", field)
            .append_pair("currentDocument.exists", "true");

        let body = json!({ "fields": { field: encode_value(&value)? } });
        debug!(%url, field, "patching firestore document");
        let response = self
            .authorize(self.client.patch(url).json(&body))
            .send()
            .await
            .map_err(transport)?;
        check_status(response, collection, Some(document_id)).await?;
        Ok(())
    }
}

async fn check_status(
    response: Response,
    collection: &str,
    document_id: Option<&str>,
) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND => match document_id {
            Some(document_id) => StoreError::not_found(collection, document_id),
            // Missing collections list as empty, so this is the project or
            // database.
            None => StoreError::Unavailable(format!(
                "listing collection {collection} failed: {status}: {body}"
            )),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            StoreError::PermissionDenied(format!("{status}: {body}"))
        }
        _ => StoreError::Unavailable(format!("{status}: {body}")),
    })
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn decode_document(document: FirestoreDocument) -> DocumentRead {
    let id = document
        .name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StoreError::Malformed(format!("bad document name '{}'", document.name)))?
        .to_string();

    let mut fields = Fields::new();
    for (name, value) in &document.fields {
        match decode_value(value) {
            Ok(decoded) => {
                fields.insert(name.clone(), decoded);
            }
            Err(err) => debug!(document = %id, field = %name, error = %err, "skipping firestore field"),
        }
    }

    Ok(StoredDocument {
        id,
        fields,
        updated_at: document.update_time,
    })
}

fn decode_value(value: &Value) -> Result<Value, String> {
    let Some((kind, inner)) = value.as_object().and_then(|object| object.iter().next()) else {
        return Err("expected a typed value object".to_string());
    };
    match kind.as_str() {
        "stringValue" | "booleanValue" | "doubleValue" => Ok(inner.clone()),
        "nullValue" => Ok(Value::Null),
        // 64-bit integers travel as decimal strings.
        "integerValue" => inner
            .as_str()
            .and_then(|raw| raw.parse::<i64>().ok())
            .or_else(|| inner.as_i64())
            .map(Value::from)
            .ok_or_else(|| format!("invalid integerValue {inner}")),
        other => Err(format!("unsupported value type {other}")),
    }
}

fn encode_value(value: &Value) -> Result<Value, StoreError> {
    Ok(match value {
        Value::String(raw) => json!({ "stringValue": raw }),
        Value::Bool(raw) => json!({ "booleanValue": raw }),
        Value::Null => json!({ "nullValue": null }),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => json!({ "integerValue": integer.to_string() }),
            None => json!({ "doubleValue": number }),
        },
        other => {
            return Err(StoreError::Malformed(format!(
                "cannot encode {other} as a firestore value"
            )))
        }
    })
}

#[cfg(test)]
#[path = "tests/firestore_tests.rs"]
mod tests;
