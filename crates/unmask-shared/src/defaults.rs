//! Fixed records the data layer falls back to or seeds with.

use crate::constants::{SEED_TOPIC_ID, SEED_TOPIC_PARTICIPANTS, TOPIC_LIFETIME_MS};
use crate::types::{Category, Topic, User};

/// The profile used when no user record exists anywhere.
pub fn default_user() -> User {
    User::default()
}

/// The discussion seeded into an empty local topic list, open for 24 hours
/// from `now`.
pub fn seed_topic(now: i64) -> Topic {
    Topic {
        id: SEED_TOPIC_ID.to_string(),
        title: "Is AI going to replace junior developers?".to_string(),
        description: "A discussion on the future of the tech industry.".to_string(),
        category: Category::Trending,
        participant_count: SEED_TOPIC_PARTICIPANTS,
        expires_at: now + TOPIC_LIFETIME_MS,
        is_closed: false,
        summary: None,
    }
}
