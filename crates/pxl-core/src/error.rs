use crate::store::StoreError;
use std::fmt::Display;
use thiserror::Error;

/// Result type for persistence layer operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;

/// The kind of record an operation addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Pixel,
    Link,
}

impl Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::Pixel => f.write_str("pixel"),
            RecordKind::Link => f.write_str("link"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    #[error("database connection is not established, call connect first")]
    NotConnected,
    #[error("database connection is already established, do not call connect twice")]
    AlreadyConnected,
    #[error("failed to establish database connection: {0}")]
    Connection(String),
    /// The identifier is taken. The caller has to retry with a fresh one.
    #[error("{kind} key already exists: {id}")]
    KeyCollision { kind: RecordKind, id: String },
    #[error("{kind} not found: {id}")]
    NotFound { kind: RecordKind, id: String },
    /// Any other store failure, surfaced as reported by the backend.
    #[error(transparent)]
    UnexpectedStore(StoreError),
}

impl PersistenceError {
    pub fn is_key_collision(&self) -> bool {
        matches!(self, PersistenceError::KeyCollision { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistenceError::NotFound { .. })
    }
}
