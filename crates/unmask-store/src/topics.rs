//! Topic list persistence. The list is kept newest first.

use unmask_shared::constants::NS_TOPICS;
use unmask_shared::Topic;

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// All stored topics in stored order (newest first).
    pub fn topics(&self) -> Result<Vec<Topic>> {
        Ok(self.read_namespace(NS_TOPICS)?.unwrap_or_default())
    }

    /// Replace the whole topic list.
    pub fn set_topics(&self, topics: &[Topic]) -> Result<()> {
        self.write_namespace(NS_TOPICS, topics)
    }

    /// Put `topic` at the front of the list.
    pub fn prepend_topic(&self, topic: &Topic) -> Result<()> {
        let mut topics = self.topics()?;
        topics.insert(0, topic.clone());
        self.set_topics(&topics)
    }
}
