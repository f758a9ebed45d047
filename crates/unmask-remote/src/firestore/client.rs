//! Firestore over its REST v1 API.
//!
//! Documents are addressed as
//! `{endpoint}/projects/{project}/databases/(default)/documents/{path}` and
//! authenticated with the project's web API key. Live queries are served by
//! polling `:runQuery` and emitting the result whenever it changes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::value::{decode_fields, encode_fields};
use crate::config::RemoteConfig;
use crate::document::{
    check_collection_path, split_document_path, Direction, Document, Fields, Query, Watch,
};
use crate::error::{RemoteError, Result};
use crate::store::DocumentStore;

pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

/// Tuning knobs for [`FirestoreStore`].
#[derive(Debug, Clone)]
pub struct FirestoreOptions {
    /// Base URL of the REST API; overridable for the local emulator.
    pub endpoint: String,
    /// Per-request timeout enforced by the HTTP client.
    pub request_timeout: Duration,
    /// How often a live query re-runs.
    pub watch_interval: Duration,
}

impl Default for FirestoreOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(30),
            watch_interval: Duration::from_secs(2),
        }
    }
}

struct Inner {
    http: Client,
    documents_url: String,
    api_key: String,
    watch_interval: Duration,
}

/// Cheaply cloneable Firestore client.
#[derive(Clone)]
pub struct FirestoreStore {
    inner: Arc<Inner>,
}

#[derive(Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Option<Value>,
}

#[derive(Deserialize)]
struct QueryRow {
    #[serde(default)]
    document: Option<RawDocument>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

impl FirestoreStore {
    /// Build a client for the configured project. No request is made.
    pub fn connect(config: &RemoteConfig, options: FirestoreOptions) -> Result<Self> {
        config
            .validate()
            .map_err(|issue| RemoteError::Config(issue.to_string()))?;

        let http = Client::builder()
            .timeout(options.request_timeout)
            .build()?;

        let documents_url = format!(
            "{}/projects/{}/databases/(default)/documents",
            options.endpoint.trim_end_matches('/'),
            config.project_id
        );

        debug!(url = %documents_url, "firestore client ready");

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                documents_url,
                api_key: config.api_key.clone(),
                watch_interval: options.watch_interval,
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.is_empty() {
            self.inner.documents_url.clone()
        } else {
            format!("{}/{}", self.inner.documents_url, path)
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Option<Value>> {
        let response = request.query(&[("key", &self.inner.api_key)]).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(RemoteError::Status {
                code: status.as_u16(),
                message,
            });
        }

        Ok(Some(response.json::<Value>().await?))
    }

    async fn query_once(&self, query: &Query) -> Result<Vec<Document>> {
        check_collection_path(&query.collection)?;
        let (parent, collection_id) = match query.collection.rfind('/') {
            Some(at) => (&query.collection[..at], &query.collection[at + 1..]),
            None => ("", query.collection.as_str()),
        };

        let mut structured = json!({ "from": [{ "collectionId": collection_id }] });
        if let Some(ref order) = query.order_by {
            let direction = match order.direction {
                Direction::Ascending => "ASCENDING",
                Direction::Descending => "DESCENDING",
            };
            structured["orderBy"] = json!([{
                "field": { "fieldPath": order.field },
                "direction": direction,
            }]);
        }

        let url = format!("{}:runQuery", self.url(parent));
        let body = json!({ "structuredQuery": structured });
        let rows = self
            .send(self.inner.http.post(url).json(&body))
            .await?
            .ok_or_else(|| RemoteError::NotFound(query.collection.clone()))?;

        let rows: Vec<QueryRow> = serde_json::from_value(rows)?;
        rows.into_iter()
            .filter_map(|row| row.document)
            .map(into_document)
            .collect()
    }
}

fn into_document(raw: RawDocument) -> Result<Document> {
    let id = raw
        .name
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RemoteError::Decode(format!("bad document name {}", raw.name)))?
        .to_string();
    let fields = match raw.fields {
        Some(ref f) => decode_fields(f)?,
        None => Fields::new(),
    };
    Ok(Document::new(id, fields))
}

fn document_body(fields: &Fields) -> Value {
    json!({ "fields": encode_fields(fields) })
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get_document(&self, path: &str) -> Result<Option<Document>> {
        split_document_path(path)?;
        match self.send(self.inner.http.get(self.url(path))).await? {
            Some(body) => Ok(Some(into_document(serde_json::from_value(body)?)?)),
            None => Ok(None),
        }
    }

    async fn set_document(&self, path: &str, fields: Fields) -> Result<()> {
        split_document_path(path)?;
        let request = self
            .inner
            .http
            .patch(self.url(path))
            .json(&document_body(&fields));
        self.send(request)
            .await?
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))?;
        Ok(())
    }

    async fn create_document(&self, collection: &str, id: &str, fields: Fields) -> Result<Document> {
        check_collection_path(collection)?;
        let request = self
            .inner
            .http
            .post(self.url(collection))
            .query(&[("documentId", id)])
            .json(&document_body(&fields));
        let body = self
            .send(request)
            .await?
            .ok_or_else(|| RemoteError::NotFound(collection.to_string()))?;
        into_document(serde_json::from_value(body)?)
    }

    async fn update_document(&self, path: &str, fields: Fields) -> Result<()> {
        split_document_path(path)?;
        let mut params: Vec<(&str, &str)> = fields
            .keys()
            .map(|k| ("updateMask.fieldPaths", k.as_str()))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let request = self
            .inner
            .http
            .patch(self.url(path))
            .query(&params)
            .json(&document_body(&fields));
        self.send(request)
            .await?
            .ok_or_else(|| RemoteError::NotFound(path.to_string()))?;
        Ok(())
    }

    async fn run_query(&self, query: &Query) -> Result<Vec<Document>> {
        self.query_once(query).await
    }

    fn watch(&self, query: Query) -> Result<Watch> {
        check_collection_path(&query.collection)?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| RemoteError::Unavailable(format!("no async runtime: {e}")))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let store = self.clone();

        runtime.spawn(async move {
            let mut ticker = tokio::time::interval(store.inner.watch_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            let mut last: Option<Vec<Document>> = None;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = tx.closed() => break,
                }

                match store.query_once(&query).await {
                    Ok(docs) => {
                        if last.as_ref() == Some(&docs) {
                            continue;
                        }
                        if tx.send(Ok(docs.clone())).is_err() {
                            break;
                        }
                        last = Some(docs);
                    }
                    Err(e) => {
                        warn!(collection = %query.collection, error = %e, "live query failed");
                        let _ = tx.send(Err(e));
                        break;
                    }
                }
            }

            debug!(collection = %query.collection, "live query stopped");
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RemoteConfig {
        RemoteConfig {
            api_key: "k".into(),
            auth_domain: "p.firebaseapp.com".into(),
            project_id: "p".into(),
            storage_bucket: "p.appspot.com".into(),
            messaging_sender_id: "1".into(),
            app_id: "a".into(),
        }
    }

    #[test]
    fn connect_rejects_placeholder_config() {
        let err = FirestoreStore::connect(&RemoteConfig::default(), FirestoreOptions::default())
            .err()
            .expect("placeholder config must not connect");
        assert!(matches!(err, RemoteError::Config(_)));
    }

    #[test]
    fn urls_are_rooted_at_project_documents() {
        let options = FirestoreOptions {
            endpoint: "http://localhost:8080/v1/".into(),
            ..FirestoreOptions::default()
        };
        let store = FirestoreStore::connect(&config(), options).unwrap();
        assert_eq!(
            store.url("users/me"),
            "http://localhost:8080/v1/projects/p/databases/(default)/documents/users/me"
        );
        assert_eq!(
            store.url(""),
            "http://localhost:8080/v1/projects/p/databases/(default)/documents"
        );
    }

    #[test]
    fn raw_document_id_is_last_name_segment() {
        let raw: RawDocument = serde_json::from_value(json!({
            "name": "projects/p/databases/(default)/documents/topics/abc",
            "fields": {"title": {"stringValue": "t"}},
            "createTime": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        let doc = into_document(raw).unwrap();
        assert_eq!(doc.id, "abc");
        assert_eq!(doc.fields["title"], "t");
    }

    #[test]
    fn query_rows_without_document_are_skipped() {
        let rows: Vec<QueryRow> = serde_json::from_value(json!([
            {"readTime": "2024-01-01T00:00:00Z"}
        ]))
        .unwrap();
        assert!(rows.into_iter().all(|r| r.document.is_none()));
    }

    #[test]
    fn watch_outside_runtime_is_unavailable() {
        let store = FirestoreStore::connect(&config(), FirestoreOptions::default()).unwrap();
        let err = store.watch(Query::collection("topics")).err().unwrap();
        assert!(matches!(err, RemoteError::Unavailable(_)));
    }
}
