use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{CURRENT_USER_ID, TOPIC_LIFETIME_MS};

/// Current wall-clock time in unix milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Fresh client-generated identifier, used for every entity on every backend.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ---------------------------------------------------------------------------
// Topic
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Category {
    College,
    Company,
    Lifestyle,
    Trending,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::College,
        Category::Company,
        Category::Lifestyle,
        Category::Trending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::College => "College",
            Category::Company => "Company",
            Category::Lifestyle => "Lifestyle",
            Category::Trending => "Trending",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discussion room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub participant_count: u32,
    /// Unix milliseconds after which the topic no longer takes messages.
    pub expires_at: i64,
    pub is_closed: bool,
    /// Cached discussion summary, if one was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Topic {
    pub fn from_draft(id: String, draft: NewTopic) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            participant_count: draft.participant_count,
            expires_at: draft.expires_at,
            is_closed: draft.is_closed,
            summary: draft.summary,
        }
    }

    /// Whether new messages may still be posted at `now` (unix millis).
    pub fn accepts_messages(&self, now: i64) -> bool {
        !self.is_closed && now < self.expires_at
    }
}

/// Topic fields minus the id, as handed to `create_topic`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTopic {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub participant_count: u32,
    pub expires_at: i64,
    pub is_closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl NewTopic {
    /// Draft for a room opened by the current user: one participant, open
    /// for the next 24 hours.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: Category,
        now: i64,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category,
            participant_count: 1,
            expires_at: now + TOPIC_LIFETIME_MS,
            is_closed: false,
            summary: None,
        }
    }
}

/// Category filter applied to topic listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TopicFilter {
    #[default]
    All,
    Only(Category),
}

impl TopicFilter {
    pub fn matches(&self, topic: &Topic) -> bool {
        match self {
            TopicFilter::All => true,
            TopicFilter::Only(category) => topic.category == *category,
        }
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A chat message inside a topic. Never modified once stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub user_id: String,
    /// Author's anonymous name at send time.
    pub anonymous_name: String,
    pub text: String,
    /// Unix milliseconds.
    pub timestamp: i64,
}

impl Message {
    /// Build an outgoing message authored by `author`.
    pub fn compose(author: &User, text: impl Into<String>, now: i64) -> Self {
        Self {
            id: new_id(),
            user_id: author.id.clone(),
            anonymous_name: author.anonymous_name.clone(),
            text: text.into(),
            timestamp: now,
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lifestyle: Option<String>,
}

/// The profile of the person using this client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub real_name: String,
    pub anonymous_name: String,
    /// URL or data URI.
    pub avatar: String,
    pub bio: String,
    #[serde(default)]
    pub details: UserDetails,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: CURRENT_USER_ID.to_string(),
            real_name: "Alex Rivera".to_string(),
            anonymous_name: "Vagabond_Traveler".to_string(),
            avatar: "https://picsum.photos/seed/alex/200".to_string(),
            bio: "Software engineer by day, musician by night.".to_string(),
            details: UserDetails {
                college: Some("Stanford University".to_string()),
                company: Some("Google".to_string()),
                lifestyle: Some("Minimalist, Coffee Enthusiast".to_string()),
            },
        }
    }
}

/// Partial update of the current user. `None` leaves a field untouched;
/// `details` replaces the whole nested record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<UserDetails>,
}

impl UserPatch {
    pub fn bio(bio: impl Into<String>) -> Self {
        Self {
            bio: Some(bio.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(ref v) = self.real_name {
            user.real_name = v.clone();
        }
        if let Some(ref v) = self.anonymous_name {
            user.anonymous_name = v.clone();
        }
        if let Some(ref v) = self.avatar {
            user.avatar = v.clone();
        }
        if let Some(ref v) = self.bio {
            user.bio = v.clone();
        }
        if let Some(ref v) = self.details {
            user.details = v.clone();
        }
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

/// Nothing in this workspace moves a connection to `Accepted` yet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
}

/// A peer connection request between two users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub status: ConnectionStatus,
}

impl Connection {
    pub fn request(from_user_id: impl Into<String>, to_user_id: impl Into<String>) -> Self {
        Self {
            id: new_id(),
            from_user_id: from_user_id.into(),
            to_user_id: to_user_id.into(),
            status: ConnectionStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_uses_camel_case_wire_names() {
        let topic = Topic::from_draft("t1".into(), NewTopic::new("a", "b", Category::Company, 0));
        let json = serde_json::to_value(&topic).unwrap();
        assert_eq!(json["participantCount"], 1);
        assert_eq!(json["expiresAt"], TOPIC_LIFETIME_MS);
        assert_eq!(json["isClosed"], false);
        assert_eq!(json["category"], "Company");
        assert!(json.get("summary").is_none());
    }

    #[test]
    fn topic_stops_accepting_at_expiry() {
        let topic = Topic::from_draft("t".into(), NewTopic::new("a", "b", Category::College, 1_000));
        assert!(topic.accepts_messages(1_000));
        assert!(!topic.accepts_messages(1_000 + TOPIC_LIFETIME_MS));

        let closed = Topic {
            is_closed: true,
            ..topic
        };
        assert!(!closed.accepts_messages(1_000));
    }

    #[test]
    fn patch_only_touches_given_fields() {
        let mut user = User::default();
        UserPatch::bio("x").apply_to(&mut user);

        let expected = User {
            bio: "x".into(),
            ..User::default()
        };
        assert_eq!(user, expected);
    }

    #[test]
    fn connection_status_is_lowercase() {
        let conn = Connection::request("me", "u2");
        let json = serde_json::to_value(&conn).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["fromUserId"], "me");
    }

    #[test]
    fn composed_message_captures_author_name() {
        let author = User::default();
        let msg = Message::compose(&author, "hello", 5);
        assert_eq!(msg.user_id, "me");
        assert_eq!(msg.anonymous_name, "Vagabond_Traveler");
        assert_eq!(msg.timestamp, 5);
        assert!(Uuid::parse_str(&msg.id).is_ok());
    }

    #[test]
    fn filter_matches_category() {
        let topic = Topic::from_draft("t".into(), NewTopic::new("a", "b", Category::Lifestyle, 0));
        assert!(TopicFilter::All.matches(&topic));
        assert!(TopicFilter::Only(Category::Lifestyle).matches(&topic));
        assert!(!TopicFilter::Only(Category::Trending).matches(&topic));
    }
}
