//! v001 -- Initial schema creation.
//!
//! Creates the `kv_store` table holding one JSON aggregate per namespace.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    namespace  TEXT PRIMARY KEY NOT NULL,   -- fixed collection key
    json       TEXT NOT NULL,               -- serialized aggregate
    updated_at TEXT NOT NULL                -- ISO-8601 / RFC-3339
);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
