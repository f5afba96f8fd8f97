use crate::config::ConnectionOptions;
use crate::record::Document;
use async_trait::async_trait;
use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("conditional check failed: {0}")]
    ConditionFailed(String),
    #[error("store backend unavailable: {0}")]
    Unavailable(String),
    #[error("store operation timed out: {0}")]
    Timeout(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("store operation failed: {0}")]
    Operation(String),
}

/// The primary key of a single item: the key attribute and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key<'a> {
    pub attribute: &'a str,
    pub value: &'a str,
}

impl<'a> Key<'a> {
    pub fn new(attribute: &'a str, value: &'a str) -> Self {
        Self { attribute, value }
    }
}

/// An exact-match lookup on a secondary index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexQuery<'a> {
    pub index: &'a str,
    pub attribute: &'a str,
    pub value: &'a str,
}

/// A schemaless key-value store offering only single-item conditional
/// operations.
///
/// Every mutating method must be one atomic primitive on the backend. Callers
/// rely on that for correctness under concurrency and never emulate these
/// operations with a read followed by a write.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Writes `item` only if no item with `key` exists in `table`.
    ///
    /// Returns `Err(ConditionFailed)` if the key is already taken.
    async fn put_if_absent(&self, table: &str, key: Key<'_>, item: Document) -> Result<()>;

    /// Atomically adds `delta` to the numeric `attribute` of an existing item
    /// and returns the whole item after the update.
    ///
    /// A missing attribute counts as zero. Returns `Err(ConditionFailed)` if
    /// no item with `key` exists.
    async fn add_if_present(
        &self,
        table: &str,
        key: Key<'_>,
        attribute: &str,
        delta: u64,
    ) -> Result<Document>;

    /// Fetches a single item. Returns `None` if the key does not exist.
    async fn get(&self, table: &str, key: Key<'_>) -> Result<Option<Document>>;

    /// Returns all items whose indexed attribute equals the queried value.
    async fn query_index(&self, table: &str, query: IndexQuery<'_>) -> Result<Vec<Document>>;
}

/// Opens store handles.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Store: DocumentStore;

    /// Establishes a new handle from caller-supplied connection parameters.
    async fn connect(&self, options: &ConnectionOptions) -> Result<Self::Store>;
}
