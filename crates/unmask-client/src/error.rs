use thiserror::Error;

use unmask_remote::RemoteError;
use unmask_store::StoreError;

/// Failure of one storage tier. Never leaves [`DataService`](crate::DataService).
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Local store error: {0}")]
    Store(#[from] StoreError),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Reasons a message is refused before it reaches any store.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PostError {
    #[error("Message is empty")]
    Empty,

    #[error("Topic {0} no longer accepts messages")]
    TopicClosed(String),

    #[error("Message flagged by moderation")]
    Rejected,
}

/// Failure reported by a content oracle.
#[derive(Error, Debug)]
pub enum OracleError {
    #[error("Oracle unavailable: {0}")]
    Unavailable(String),
}
