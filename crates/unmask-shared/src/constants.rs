/// Application name
pub const APP_NAME: &str = "Unmask";

/// Id of the single local user record, locally and remotely
pub const CURRENT_USER_ID: &str = "me";

/// Local store namespaces, one serialized aggregate each
pub const NS_TOPICS: &str = "unmask_local_topics";
pub const NS_USER: &str = "unmask_local_user";
pub const NS_CONNECTIONS: &str = "unmask_local_connections";
pub const NS_MESSAGES: &str = "unmask_local_messages";

/// Remote collection names
pub const COLLECTION_TOPICS: &str = "topics";
pub const COLLECTION_USERS: &str = "users";
pub const COLLECTION_CONNECTIONS: &str = "connections";
pub const COLLECTION_MESSAGES: &str = "messages";

/// Remote document field used to order topic listings (descending)
pub const FIELD_EXPIRES_AT: &str = "expiresAt";

/// Remote document field used to order message sequences (ascending)
pub const FIELD_TIMESTAMP: &str = "timestamp";

/// Lifetime of a newly opened topic in milliseconds (24 hours)
pub const TOPIC_LIFETIME_MS: i64 = 86_400_000;

/// Id of the topic seeded into an empty local store
pub const SEED_TOPIC_ID: &str = "1";

/// Participant count of the seeded topic
pub const SEED_TOPIC_PARTICIPANTS: u32 = 42;

/// Path of the messages sub-collection for a topic.
pub fn messages_collection(topic_id: &str) -> String {
    format!("{COLLECTION_TOPICS}/{topic_id}/{COLLECTION_MESSAGES}")
}

/// Path of the current user document.
pub fn current_user_path() -> String {
    format!("{COLLECTION_USERS}/{CURRENT_USER_ID}")
}
