//! Hosted document store client.

mod client;
pub mod value;

pub use client::{FirestoreOptions, FirestoreStore, DEFAULT_ENDPOINT};
