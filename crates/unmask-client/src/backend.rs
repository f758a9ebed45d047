//! The two storage tiers behind [`DataService`](crate::DataService).
//!
//! Both implement [`EntityStore`], so the service can run any operation
//! against either tier through one fallback combinator.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{info, warn};

use unmask_remote::document::{decode_all, encode};
use unmask_remote::{Direction, Document, DocumentStore, Query, RemoteError, Watch};
use unmask_shared::constants::{
    current_user_path, messages_collection, COLLECTION_CONNECTIONS, COLLECTION_TOPICS,
    FIELD_EXPIRES_AT, FIELD_TIMESTAMP,
};
use unmask_shared::defaults::{default_user, seed_topic};
use unmask_shared::{Connection, Message, Topic, User, UserPatch};
use unmask_store::Database;

use crate::error::BackendResult;

/// Entity-level operations shared by both tiers.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Topics, most recent first.
    async fn list_topics(&self) -> BackendResult<Vec<Topic>>;

    async fn create_topic(&self, topic: &Topic) -> BackendResult<()>;

    /// The current user record; `None` when it was never written.
    async fn current_user(&self) -> BackendResult<Option<User>>;

    async fn update_user(&self, patch: &UserPatch) -> BackendResult<()>;

    async fn list_connections(&self) -> BackendResult<Vec<Connection>>;

    async fn add_connection(&self, connection: &Connection) -> BackendResult<()>;

    async fn save_message(&self, topic_id: &str, message: &Message) -> BackendResult<()>;

    /// Messages of a topic in ascending timestamp order.
    async fn messages(&self, topic_id: &str) -> BackendResult<Vec<Message>>;
}

// ---------------------------------------------------------------------------
// Local tier
// ---------------------------------------------------------------------------

/// The SQLite-backed store. Every call runs to completion without yielding.
pub struct LocalEntityStore {
    db: Mutex<Database>,
}

impl LocalEntityStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn db(&self) -> MutexGuard<'_, Database> {
        // A panic mid-write leaves at worst a stale aggregate; keep serving.
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Synchronous snapshot of a topic's messages; empty on any error.
    pub fn message_snapshot(&self, topic_id: &str) -> Vec<Message> {
        self.db().messages(topic_id).unwrap_or_else(|e| {
            warn!(topic_id, error = %e, "reading local messages failed");
            Vec::new()
        })
    }

    /// Write the seed topic if the topic list is empty. Returns whether it
    /// did.
    pub fn seed_topics_if_empty(&self, now: i64) -> BackendResult<bool> {
        let db = self.db();
        if !db.topics()?.is_empty() {
            return Ok(false);
        }
        db.set_topics(&[seed_topic(now)])?;
        Ok(true)
    }
}

#[async_trait]
impl EntityStore for LocalEntityStore {
    async fn list_topics(&self) -> BackendResult<Vec<Topic>> {
        Ok(self.db().topics()?)
    }

    async fn create_topic(&self, topic: &Topic) -> BackendResult<()> {
        Ok(self.db().prepend_topic(topic)?)
    }

    async fn current_user(&self) -> BackendResult<Option<User>> {
        Ok(self.db().user()?)
    }

    async fn update_user(&self, patch: &UserPatch) -> BackendResult<()> {
        self.db().merge_user(patch)?;
        Ok(())
    }

    async fn list_connections(&self) -> BackendResult<Vec<Connection>> {
        Ok(self.db().connections()?)
    }

    async fn add_connection(&self, connection: &Connection) -> BackendResult<()> {
        Ok(self.db().append_connection(connection)?)
    }

    async fn save_message(&self, topic_id: &str, message: &Message) -> BackendResult<()> {
        Ok(self.db().append_message(topic_id, message)?)
    }

    async fn messages(&self, topic_id: &str) -> BackendResult<Vec<Message>> {
        Ok(self.db().messages(topic_id)?)
    }
}

// ---------------------------------------------------------------------------
// Remote tier
// ---------------------------------------------------------------------------

/// Entity mapping over a hosted [`DocumentStore`].
pub struct RemoteEntityStore {
    docs: Arc<dyn DocumentStore>,
}

impl RemoteEntityStore {
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self { docs }
    }

    /// Write the default user document if it does not exist yet. Returns
    /// whether it was created.
    pub async fn ensure_current_user(&self) -> BackendResult<bool> {
        let path = current_user_path();
        if self.docs.get_document(&path).await?.is_some() {
            return Ok(false);
        }
        self.docs.set_document(&path, encode(&default_user())?).await?;
        info!("created default user document");
        Ok(true)
    }

    /// Register a live query over a topic's messages, ascending by timestamp.
    pub fn watch_messages(&self, topic_id: &str) -> BackendResult<Watch> {
        let query = Query::collection(messages_collection(topic_id))
            .order_by(FIELD_TIMESTAMP, Direction::Ascending);
        Ok(self.docs.watch(query)?)
    }
}

/// Decode a live query result into messages.
pub fn decode_messages(docs: &[Document]) -> Result<Vec<Message>, RemoteError> {
    decode_all(docs)
}

#[async_trait]
impl EntityStore for RemoteEntityStore {
    async fn list_topics(&self) -> BackendResult<Vec<Topic>> {
        let query =
            Query::collection(COLLECTION_TOPICS).order_by(FIELD_EXPIRES_AT, Direction::Descending);
        let docs = self.docs.run_query(&query).await?;
        Ok(decode_all(&docs)?)
    }

    async fn create_topic(&self, topic: &Topic) -> BackendResult<()> {
        self.docs
            .create_document(COLLECTION_TOPICS, &topic.id, encode(topic)?)
            .await?;
        Ok(())
    }

    async fn current_user(&self) -> BackendResult<Option<User>> {
        match self.docs.get_document(&current_user_path()).await? {
            Some(doc) => Ok(Some(doc.decode()?)),
            None => Ok(None),
        }
    }

    async fn update_user(&self, patch: &UserPatch) -> BackendResult<()> {
        self.docs
            .update_document(&current_user_path(), encode(patch)?)
            .await?;
        Ok(())
    }

    async fn list_connections(&self) -> BackendResult<Vec<Connection>> {
        let docs = self
            .docs
            .run_query(&Query::collection(COLLECTION_CONNECTIONS))
            .await?;
        Ok(decode_all(&docs)?)
    }

    async fn add_connection(&self, connection: &Connection) -> BackendResult<()> {
        self.docs
            .create_document(COLLECTION_CONNECTIONS, &connection.id, encode(connection)?)
            .await?;
        Ok(())
    }

    async fn save_message(&self, topic_id: &str, message: &Message) -> BackendResult<()> {
        self.docs
            .create_document(&messages_collection(topic_id), &message.id, encode(message)?)
            .await?;
        Ok(())
    }

    async fn messages(&self, topic_id: &str) -> BackendResult<Vec<Message>> {
        let query = Query::collection(messages_collection(topic_id))
            .order_by(FIELD_TIMESTAMP, Direction::Ascending);
        let docs = self.docs.run_query(&query).await?;
        Ok(decode_all(&docs)?)
    }
}
