use thiserror::Error;

/// Errors produced by remote document store clients.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Transport-level failure (DNS, TLS, timeout, connection reset).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("Remote store returned {code}: {message}")]
    Status { code: u16, message: String },

    /// A response or document could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// JSON (de)serialization of an entity failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A document that must exist does not.
    #[error("Document not found: {0}")]
    NotFound(String),

    /// The store cannot serve requests right now.
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    /// The client was built from an unusable configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RemoteError>;
