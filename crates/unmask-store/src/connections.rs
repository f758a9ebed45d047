use unmask_shared::constants::NS_CONNECTIONS;
use unmask_shared::Connection;

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// All stored connections in insertion order.
    pub fn connections(&self) -> Result<Vec<Connection>> {
        Ok(self.read_namespace(NS_CONNECTIONS)?.unwrap_or_default())
    }

    pub fn append_connection(&self, connection: &Connection) -> Result<()> {
        let mut all = self.connections()?;
        all.push(connection.clone());
        self.write_namespace(NS_CONNECTIONS, &all)
    }
}
