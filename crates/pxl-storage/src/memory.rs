use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use pxl_core::store::{Connector, DocumentStore, IndexQuery, Key, Result, StoreError};
use pxl_core::{ConnectionOptions, Document};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

type Table = Arc<DashMap<String, Document>>;

/// In-memory implementation of [`DocumentStore`] using DashMap.
///
/// Conditional writes and counter updates run under the shard lock of the
/// addressed item, which gives them the same single-item atomicity a real
/// backend provides. Index queries scan the whole table. Cloning the store
/// shares the underlying data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<DashMap<String, Table>>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items currently held in `table`.
    pub fn len(&self, table: &str) -> usize {
        self.existing_table(table).map_or(0, |table| table.len())
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    fn table(&self, name: &str) -> Table {
        self.tables.entry(name.to_owned()).or_default().value().clone()
    }

    fn existing_table(&self, name: &str) -> Option<Table> {
        self.tables.get(name).map(|table| table.value().clone())
    }
}

fn missing_key(table: &str, key: Key<'_>) -> StoreError {
    StoreError::ConditionFailed(format!(
        "no item with {}='{}' in table '{}'",
        key.attribute, key.value, table
    ))
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn put_if_absent(&self, table: &str, key: Key<'_>, item: Document) -> Result<()> {
        trace!(table, key = key.value, "in-memory put_if_absent");

        match self.table(table).entry(key.value.to_owned()) {
            Entry::Occupied(_) => Err(StoreError::ConditionFailed(format!(
                "item with {}='{}' already exists in table '{}'",
                key.attribute, key.value, table
            ))),
            Entry::Vacant(slot) => {
                slot.insert(item);
                Ok(())
            }
        }
    }

    async fn add_if_present(
        &self,
        table: &str,
        key: Key<'_>,
        attribute: &str,
        delta: u64,
    ) -> Result<Document> {
        trace!(table, key = key.value, attribute, delta, "in-memory add_if_present");

        let items = self
            .existing_table(table)
            .ok_or_else(|| missing_key(table, key))?;
        let mut item = items
            .get_mut(key.value)
            .ok_or_else(|| missing_key(table, key))?;

        let current = match item.get(attribute) {
            None => 0,
            Some(value) => value.as_u64().ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "attribute '{attribute}' of '{}' is not a counter: {value}",
                    key.value
                ))
            })?,
        };
        let next = current.checked_add(delta).ok_or_else(|| {
            StoreError::Operation(format!(
                "attribute '{attribute}' of '{}' would overflow",
                key.value
            ))
        })?;

        item.insert(attribute.to_owned(), Value::from(next));
        Ok(item.value().clone())
    }

    async fn get(&self, table: &str, key: Key<'_>) -> Result<Option<Document>> {
        let Some(items) = self.existing_table(table) else {
            return Ok(None);
        };
        let item = items.get(key.value).map(|item| item.value().clone());
        Ok(item)
    }

    async fn query_index(&self, table: &str, query: IndexQuery<'_>) -> Result<Vec<Document>> {
        let Some(items) = self.existing_table(table) else {
            return Ok(Vec::new());
        };

        let matches = items
            .iter()
            .filter(|item| {
                item.value().get(query.attribute).and_then(Value::as_str) == Some(query.value)
            })
            .map(|item| item.value().clone())
            .collect();
        Ok(matches)
    }
}

/// Hands out handles to one shared [`InMemoryStore`].
///
/// Data survives disconnecting and reconnecting, like it would with a
/// database server.
#[derive(Debug, Clone, Default)]
pub struct InMemoryConnector {
    store: InMemoryStore,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connector serving an existing store.
    pub fn with_store(store: InMemoryStore) -> Self {
        Self { store }
    }

    /// Returns the store this connector hands out.
    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }
}

#[async_trait]
impl Connector for InMemoryConnector {
    type Store = InMemoryStore;

    async fn connect(&self, options: &ConnectionOptions) -> Result<InMemoryStore> {
        options.validate().map_err(StoreError::Unavailable)?;
        Ok(self.store.clone())
    }
}
