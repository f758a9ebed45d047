use async_trait::async_trait;

use crate::document::{Document, Fields, Query, Watch};
use crate::error::Result;

/// A hierarchical document database: collections of documents, each
/// document addressed by `collection/.../id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document; `Ok(None)` when it does not exist.
    async fn get_document(&self, path: &str) -> Result<Option<Document>>;

    /// Create or fully replace the document at `path`.
    async fn set_document(&self, path: &str, fields: Fields) -> Result<()>;

    /// Create a new document under `collection` with the caller's `id`.
    async fn create_document(&self, collection: &str, id: &str, fields: Fields) -> Result<Document>;

    /// Overwrite the given top-level fields of an existing document. Fails
    /// with [`RemoteError::NotFound`](crate::RemoteError::NotFound) when the
    /// document does not exist.
    async fn update_document(&self, path: &str, fields: Fields) -> Result<()>;

    /// Run a collection query once.
    async fn run_query(&self, query: &Query) -> Result<Vec<Document>>;

    /// Register a live query. The first item is the current result set;
    /// later items follow each change. Must be called from inside a tokio
    /// runtime.
    fn watch(&self, query: Query) -> Result<Watch>;
}
