//! Raw namespace access: one JSON aggregate per key.

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// Raw JSON stored under `namespace`, if any.
    pub fn read_raw(&self, namespace: &str) -> Result<Option<String>> {
        let json = self
            .conn()
            .query_row(
                "SELECT json FROM kv_store WHERE namespace = ?1",
                params![namespace],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(json)
    }

    /// Replace the raw JSON stored under `namespace`.
    pub fn write_raw(&self, namespace: &str, json: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO kv_store (namespace, json, updated_at)
             VALUES (?1, ?2, ?3)",
            params![namespace, json, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Decode the aggregate under `namespace`.
    ///
    /// Returns `None` when the namespace is absent or its content does not
    /// decode as `T`; corruption is logged and otherwise treated as absence.
    pub fn read_namespace<T: DeserializeOwned>(&self, namespace: &str) -> Result<Option<T>> {
        let Some(json) = self.read_raw(namespace)? else {
            return Ok(None);
        };

        match serde_json::from_str(&json) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                tracing::warn!(namespace, error = %e, "corrupt namespace, treating as empty");
                Ok(None)
            }
        }
    }

    /// Serialize `value` and replace the whole aggregate under `namespace`.
    pub fn write_namespace<T: Serialize + ?Sized>(&self, namespace: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        self.write_raw(namespace, &json)
    }
}
