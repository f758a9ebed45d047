//! Seam to the external moderation and summarization service.
//!
//! The service itself lives outside this workspace; the data layer only
//! needs a yes/no verdict on outgoing text and a summary of a finished
//! discussion.

use async_trait::async_trait;
use tracing::{error, warn};

use unmask_shared::{Message, Topic};

use crate::error::OracleError;

pub const NO_DISCUSSION: &str = "No discussion took place.";
pub const SUMMARY_FAILED: &str = "Failed to generate summary.";
pub const SUMMARY_ERROR: &str = "Error generating summary. Please try again later.";

#[async_trait]
pub trait ContentOracle: Send + Sync {
    /// Whether `text` may be posted.
    async fn is_acceptable(&self, text: &str) -> Result<bool, OracleError>;

    /// Summarize the discussion `transcript` held under `title`.
    async fn summarize(&self, title: &str, transcript: &str) -> Result<String, OracleError>;
}

/// Accepts everything and reports the transcript's size as its summary.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

#[async_trait]
impl ContentOracle for AllowAll {
    async fn is_acceptable(&self, _text: &str) -> Result<bool, OracleError> {
        Ok(true)
    }

    async fn summarize(&self, title: &str, transcript: &str) -> Result<String, OracleError> {
        let lines = transcript.lines().count();
        Ok(format!("{lines} messages were exchanged about \"{title}\"."))
    }
}

/// One `name: text` line per message.
pub fn transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.anonymous_name, m.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Moderation fails open: an unreachable oracle lets the message through.
pub async fn moderate(oracle: &dyn ContentOracle, text: &str) -> bool {
    match oracle.is_acceptable(text).await {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!(error = %e, "moderation unavailable, allowing message");
            true
        }
    }
}

/// Summary of `topic`: the cached one if present, otherwise asked from the
/// oracle. Never fails.
pub async fn summarize_discussion(
    oracle: &dyn ContentOracle,
    topic: &Topic,
    messages: &[Message],
) -> String {
    if let Some(ref cached) = topic.summary {
        return cached.clone();
    }
    if messages.is_empty() {
        return NO_DISCUSSION.to_string();
    }

    match oracle.summarize(&topic.title, &transcript(messages)).await {
        Ok(summary) if summary.trim().is_empty() => SUMMARY_FAILED.to_string(),
        Ok(summary) => summary,
        Err(e) => {
            error!(topic_id = %topic.id, error = %e, "summary generation failed");
            SUMMARY_ERROR.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use unmask_shared::{Category, NewTopic, User};

    use super::*;

    struct Broken;

    #[async_trait]
    impl ContentOracle for Broken {
        async fn is_acceptable(&self, _text: &str) -> Result<bool, OracleError> {
            Err(OracleError::Unavailable("offline".into()))
        }

        async fn summarize(&self, _title: &str, _transcript: &str) -> Result<String, OracleError> {
            Err(OracleError::Unavailable("offline".into()))
        }
    }

    struct Blank;

    #[async_trait]
    impl ContentOracle for Blank {
        async fn is_acceptable(&self, _text: &str) -> Result<bool, OracleError> {
            Ok(false)
        }

        async fn summarize(&self, _title: &str, _transcript: &str) -> Result<String, OracleError> {
            Ok("   ".into())
        }
    }

    fn topic() -> Topic {
        Topic::from_draft("t".into(), NewTopic::new("Remote work", "d", Category::Company, 0))
    }

    fn messages() -> Vec<Message> {
        let user = User::default();
        vec![
            Message::compose(&user, "I like it", 1),
            Message::compose(&user, "Me too", 2),
        ]
    }

    #[test]
    fn transcript_lines() {
        assert_eq!(
            transcript(&messages()),
            "Vagabond_Traveler: I like it\nVagabond_Traveler: Me too"
        );
    }

    #[tokio::test]
    async fn moderation_fails_open() {
        assert!(moderate(&Broken, "anything").await);
        assert!(!moderate(&Blank, "anything").await);
    }

    #[tokio::test]
    async fn summary_fallbacks() {
        assert_eq!(summarize_discussion(&AllowAll, &topic(), &[]).await, NO_DISCUSSION);
        assert_eq!(summarize_discussion(&Broken, &topic(), &messages()).await, SUMMARY_ERROR);
        assert_eq!(summarize_discussion(&Blank, &topic(), &messages()).await, SUMMARY_FAILED);

        let cached = Topic {
            summary: Some("cached".into()),
            ..topic()
        };
        assert_eq!(summarize_discussion(&Broken, &cached, &[]).await, "cached");
    }

    #[tokio::test]
    async fn allow_all_counts_lines() {
        let summary = summarize_discussion(&AllowAll, &topic(), &messages()).await;
        assert_eq!(summary, "2 messages were exchanged about \"Remote work\".");
    }
}
