//! # unmask-store
//!
//! Local persistence for the Unmask data layer, backed by SQLite.
//!
//! The store is a namespaced key-value table: each of the four collections
//! (topics, user, connections, messages) lives under a fixed namespace as a
//! single JSON aggregate. Every write replaces the whole aggregate. A missing
//! or unreadable namespace reads as empty, never as an error.
//!
//! The crate exposes a synchronous [`Database`] handle with typed helpers for
//! every collection.

pub mod connections;
pub mod database;
pub mod messages;
pub mod migrations;
pub mod namespaces;
pub mod topics;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
