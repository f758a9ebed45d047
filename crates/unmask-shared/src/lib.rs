//! Entity types and fixed values shared by every Unmask crate.

pub mod constants;
pub mod defaults;
pub mod types;

pub use types::*;
