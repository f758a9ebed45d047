//! The single data-access surface used by the UI layer.
//!
//! Every operation tries the remote store first when one is connected and
//! falls back to the local store on any remote failure. No operation ever
//! returns a storage error to its caller.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use unmask_remote::DocumentStore;
use unmask_shared::defaults::default_user;
use unmask_shared::{
    new_id, now_millis, Connection, Message, NewTopic, Topic, TopicFilter, User, UserPatch,
};
use unmask_store::{Database, StoreError};

use crate::backend::{EntityStore, LocalEntityStore, RemoteEntityStore};
use crate::config::ClientConfig;
use crate::error::{BackendResult, PostError};
use crate::oracle::{self, AllowAll, ContentOracle};
use crate::selector::{select_backend, FirestoreConnector};
use crate::subscription::Subscription;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
}

/// Everything the home screen needs, loaded together.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub topics: Vec<Topic>,
    pub user: User,
    pub connections: Vec<Connection>,
}

pub struct DataService {
    remote: Option<Arc<RemoteEntityStore>>,
    local: Arc<LocalEntityStore>,
    oracle: Arc<dyn ContentOracle>,
    mirror_writes: bool,
}

impl DataService {
    /// Assemble a service from explicit parts. `remote` is `None` for
    /// local-only mode.
    pub fn new(config: &ClientConfig, remote: Option<Arc<dyn DocumentStore>>, local: Database) -> Self {
        Self {
            remote: remote.map(|docs| Arc::new(RemoteEntityStore::new(docs))),
            local: Arc::new(LocalEntityStore::new(local)),
            oracle: Arc::new(AllowAll),
            mirror_writes: config.mirror_writes,
        }
    }

    /// Local-only service over `local`.
    pub fn local_only(local: Database) -> Self {
        Self::new(&ClientConfig::default(), None, local)
    }

    /// Production wiring: pick the backend from `config.remote` and open the
    /// local store in `config.data_dir` (or the platform default).
    ///
    /// An unopenable store file is replaced by an in-memory one for the
    /// session; only a failure of that too is returned.
    pub fn open(config: &ClientConfig) -> Result<Self, StoreError> {
        let connector = FirestoreConnector {
            options: config.firestore_options(),
        };
        let remote = select_backend(&config.remote, &connector);

        let opened = match config.data_dir {
            Some(ref dir) => Database::open_in_dir(dir),
            None => Database::new(),
        };
        let local = match opened {
            Ok(db) => db,
            Err(e) => {
                error!(error = %e, "local store unavailable, keeping data in memory for this session");
                Database::open_in_memory()?
            }
        };

        Ok(Self::new(config, remote, local))
    }

    /// Replace the moderation/summary oracle.
    pub fn with_oracle(mut self, oracle: Arc<dyn ContentOracle>) -> Self {
        self.oracle = oracle;
        self
    }

    /// Whether a remote store handle was established at startup.
    pub fn is_cloud_connected(&self) -> bool {
        self.remote.is_some()
    }

    // ------------------------------------------------------------------
    // Fallback combinator
    // ------------------------------------------------------------------

    /// Run `call` against the remote tier, then against the local tier if
    /// there is no remote or it failed. A local failure yields `fallback()`.
    ///
    /// For writes that succeed remotely, `call` is replayed locally when
    /// write mirroring is on; the local outcome is only logged.
    async fn with_fallback<T, F, Fut>(
        &self,
        op: &'static str,
        access: Access,
        call: F,
        fallback: impl FnOnce() -> T,
    ) -> T
    where
        F: Fn(Arc<dyn EntityStore>) -> Fut,
        Fut: Future<Output = BackendResult<T>>,
    {
        let local: Arc<dyn EntityStore> = self.local.clone();

        if let Some(ref remote) = self.remote {
            let remote: Arc<dyn EntityStore> = remote.clone();
            match call(remote).await {
                Ok(value) => {
                    if access == Access::Write && self.mirror_writes {
                        if let Err(e) = call(local).await {
                            warn!(op, error = %e, "mirroring remote write to local store failed");
                        }
                    }
                    return value;
                }
                Err(e) => warn!(op, error = %e, "remote call failed, falling back to local store"),
            }
        }

        match call(local).await {
            Ok(value) => value,
            Err(e) => {
                error!(op, error = %e, "local store call failed");
                fallback()
            }
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Idempotent startup bootstrap. Never fails.
    ///
    /// Remotely, creates the default user document when missing; a failure
    /// there is logged and leaves remote mode on. Locally, seeds the topic
    /// list when empty.
    pub async fn initialize(&self) {
        if let Some(ref remote) = self.remote {
            if let Err(e) = remote.ensure_current_user().await {
                error!(error = %e, "remote bootstrap failed (permissions or offline)");
            }
        }

        match self.local.seed_topics_if_empty(now_millis()) {
            Ok(true) => info!("seeded local topic list"),
            Ok(false) => {}
            Err(e) => error!(error = %e, "seeding local topics failed"),
        }
    }

    /// Topics, user and connections, fetched concurrently.
    pub async fn dashboard(&self) -> Dashboard {
        let (topics, user, connections) = futures::join!(
            self.list_topics(),
            self.current_user(),
            self.list_connections()
        );
        Dashboard {
            topics,
            user,
            connections,
        }
    }

    // ------------------------------------------------------------------
    // Topics
    // ------------------------------------------------------------------

    /// Topics, most recent first: by descending expiry remotely, by
    /// creation locally.
    pub async fn list_topics(&self) -> Vec<Topic> {
        self.with_fallback(
            "list_topics",
            Access::Read,
            |store| async move { store.list_topics().await },
            Vec::new,
        )
        .await
    }

    pub async fn list_topics_in(&self, filter: TopicFilter) -> Vec<Topic> {
        let mut topics = self.list_topics().await;
        topics.retain(|t| filter.matches(t));
        topics
    }

    /// Store a new topic under a fresh id and return it.
    pub async fn create_topic(&self, draft: NewTopic) -> Topic {
        let topic = Topic::from_draft(new_id(), draft);
        let stored = topic.clone();
        self.with_fallback(
            "create_topic",
            Access::Write,
            |store| {
                let topic = topic.clone();
                async move { store.create_topic(&topic).await }
            },
            || (),
        )
        .await;
        debug!(topic_id = %stored.id, "topic created");
        stored
    }

    // ------------------------------------------------------------------
    // Current user
    // ------------------------------------------------------------------

    /// The current user; the default profile if none is stored.
    pub async fn current_user(&self) -> User {
        self.with_fallback(
            "current_user",
            Access::Read,
            |store| async move {
                store
                    .current_user()
                    .await
                    .map(|user| user.unwrap_or_else(default_user))
            },
            default_user,
        )
        .await
    }

    /// Merge `patch` into the current user.
    pub async fn update_current_user(&self, patch: UserPatch) {
        if patch.is_empty() {
            return;
        }
        self.with_fallback(
            "update_current_user",
            Access::Write,
            |store| {
                let patch = patch.clone();
                async move { store.update_user(&patch).await }
            },
            || (),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Connections
    // ------------------------------------------------------------------

    pub async fn list_connections(&self) -> Vec<Connection> {
        self.with_fallback(
            "list_connections",
            Access::Read,
            |store| async move { store.list_connections().await },
            Vec::new,
        )
        .await
    }

    pub async fn add_connection(&self, connection: Connection) {
        self.with_fallback(
            "add_connection",
            Access::Write,
            |store| {
                let connection = connection.clone();
                async move { store.add_connection(&connection).await }
            },
            || (),
        )
        .await
    }

    /// Ask to connect with the author `target_user_id`. The request stays
    /// pending; nothing here accepts it.
    pub async fn request_connection(&self, target_user_id: &str) -> Connection {
        let me = self.current_user().await;
        let connection = Connection::request(me.id, target_user_id);
        self.add_connection(connection.clone()).await;
        connection
    }

    // ------------------------------------------------------------------
    // Messages
    // ------------------------------------------------------------------

    pub async fn send_message(&self, topic_id: &str, message: Message) {
        self.with_fallback(
            "send_message",
            Access::Write,
            |store| {
                let message = message.clone();
                async move { store.save_message(topic_id, &message).await }
            },
            || (),
        )
        .await
    }

    /// Compose, moderate and send `text` as the current user.
    ///
    /// Returns the sent message. In local mode the caller must add it to its
    /// own view; local subscriptions do not push it.
    pub async fn post_message(&self, topic: &Topic, text: &str) -> Result<Message, PostError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PostError::Empty);
        }

        let now = now_millis();
        if !topic.accepts_messages(now) {
            return Err(PostError::TopicClosed(topic.id.clone()));
        }
        if !oracle::moderate(self.oracle.as_ref(), text).await {
            info!(topic_id = %topic.id, "message rejected by moderation");
            return Err(PostError::Rejected);
        }

        let author = self.current_user().await;
        let message = Message::compose(&author, text, now);
        self.send_message(&topic.id, message.clone()).await;
        Ok(message)
    }

    /// Deliver the messages of `topic_id` to `callback`.
    ///
    /// With a remote store the callback receives the full ordered list now
    /// and after every change, until the returned handle is unsubscribed.
    /// Without one (or if the live query cannot be registered) it is called
    /// exactly once, before this returns, with the local list.
    ///
    /// The callback may unsubscribe its own handle. A panic in the callback
    /// is logged and ends the subscription in both modes.
    pub fn subscribe_messages<F>(&self, topic_id: &str, callback: F) -> Subscription
    where
        F: FnMut(Vec<Message>) + Send + 'static,
    {
        let callback = Box::new(callback);

        if let Some(ref remote) = self.remote {
            let registered = tokio::runtime::Handle::try_current()
                .map_err(|e| e.to_string())
                .and_then(|runtime| {
                    remote
                        .watch_messages(topic_id)
                        .map(|watch| (runtime, watch))
                        .map_err(|e| e.to_string())
                });

            match registered {
                Ok((runtime, watch)) => {
                    return Subscription::live(
                        &runtime,
                        watch,
                        self.local.clone(),
                        topic_id.to_string(),
                        callback,
                    );
                }
                Err(e) => {
                    warn!(topic_id, error = %e, "live subscription failed, delivering local snapshot");
                }
            }
        }

        Subscription::snapshot(&self.local, topic_id, callback)
    }

    /// Summary of a topic's discussion, from cache or the oracle.
    pub async fn summarize(&self, topic: &Topic, messages: &[Message]) -> String {
        oracle::summarize_discussion(self.oracle.as_ref(), topic, messages).await
    }
}
