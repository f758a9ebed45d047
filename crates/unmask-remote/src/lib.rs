//! # unmask-remote
//!
//! Client side of the hosted multi-tenant document store.
//!
//! [`DocumentStore`] is the seam the data layer depends on. [`FirestoreStore`]
//! talks to the hosted service over REST; [`MemoryDocumentStore`] keeps
//! everything in process. [`RemoteConfig`] decides whether the hosted store
//! is configured at all.

pub mod config;
pub mod document;
pub mod firestore;
pub mod memory;
pub mod store;

mod error;

pub use config::{ConfigIssue, RemoteConfig};
pub use document::{Direction, Document, Fields, OrderBy, Query, Watch};
pub use error::{RemoteError, Result};
pub use firestore::{FirestoreOptions, FirestoreStore};
pub use memory::MemoryDocumentStore;
pub use store::DocumentStore;
