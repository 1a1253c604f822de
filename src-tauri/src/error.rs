//! Error taxonomy for the ordering backend.
//!
//! Every failure a UI control can surface falls into one of three buckets:
//! validation (bad checkout or form input), persistence (the document store
//! rejected a read or write), or auth (admin password mismatch). Commands
//! convert these to plain strings at the IPC boundary; nothing is retried.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or malformed user input. The operation was not attempted.
    #[error("{0}")]
    Validation(String),

    /// The document store rejected a read or write.
    #[error("database error: {0}")]
    Persistence(String),

    /// Admin password mismatch. Deliberately carries no detail.
    #[error("Wrong password")]
    Auth,
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        StoreError::Validation(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        StoreError::Persistence(msg.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Persistence(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Persistence(format!("document decode: {e}"))
    }
}
