use std::collections::HashMap;

use unmask_shared::constants::NS_MESSAGES;
use unmask_shared::Message;

use crate::database::Database;
use crate::error::Result;

type MessagesByTopic = HashMap<String, Vec<Message>>;

impl Database {
    /// Stored messages of `topic_id`, ordered by timestamp.
    pub fn messages(&self, topic_id: &str) -> Result<Vec<Message>> {
        let mut all = self.all_messages()?;
        Ok(all.remove(topic_id).unwrap_or_default())
    }

    /// Add `message` to the sequence of `topic_id`, after every message with
    /// an equal or earlier timestamp.
    pub fn append_message(&self, topic_id: &str, message: &Message) -> Result<()> {
        let mut all = self.all_messages()?;
        let sequence = all.entry(topic_id.to_string()).or_default();

        let at = sequence.partition_point(|m| m.timestamp <= message.timestamp);
        sequence.insert(at, message.clone());

        self.write_namespace(NS_MESSAGES, &all)
    }

    fn all_messages(&self) -> Result<MessagesByTopic> {
        Ok(self.read_namespace(NS_MESSAGES)?.unwrap_or_default())
    }
}
