use async_trait::async_trait;
use parking_lot::RwLock;
use pxl_core::record::{LINK_KEY, LINK_VALUE, PIXEL_COUNT, PIXEL_KEY};
use pxl_core::store::{Connector, DocumentStore, IndexQuery, Key, StoreError};
use pxl_core::{
    ConnectionOptions, LinkId, LinkRecord, Metadata, PersistenceConfig, PersistenceError,
    PersistenceLayer, PixelId, PixelRecord, RecordKind, Result,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A [`PersistenceLayer`] on top of any [`DocumentStore`].
///
/// Uniqueness of pixel and link identifiers is enforced with conditional
/// inserts, and pixel hits with the store's atomic add. The adapter never
/// reads a record in order to write it back.
///
/// The store handle is owned by the instance and exists between `connect`
/// and `disconnect`. The lock only guards swapping the handle; data
/// operations clone it and run without coordination.
pub struct StorePersistenceLayer<C: Connector> {
    connector: C,
    config: PersistenceConfig,
    handle: RwLock<Option<Arc<C::Store>>>,
}

impl<C: Connector> StorePersistenceLayer<C> {
    /// Creates a disconnected persistence layer.
    pub fn new(connector: C, config: PersistenceConfig) -> Self {
        Self {
            connector,
            config,
            handle: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &PersistenceConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.handle.read().is_some()
    }

    fn store(&self) -> Result<Arc<C::Store>> {
        self.handle
            .read()
            .as_ref()
            .cloned()
            .ok_or(PersistenceError::NotConnected)
    }

    /// Returns the stored link for `link` if it has been shortened before.
    async fn find_existing_link(&self, store: &C::Store, link: &str) -> Result<Option<LinkRecord>> {
        let query = IndexQuery {
            index: &self.config.link_index,
            attribute: LINK_VALUE,
            value: link,
        };

        let items = store
            .query_index(&self.config.link_table, query)
            .await
            .map_err(|e| unexpected("query link index", e))?;

        let Some(item) = items.into_iter().next() else {
            return Ok(None);
        };
        let record = LinkRecord::try_from(item).map_err(|e| unexpected("query link index", e))?;
        Ok(Some(record))
    }

    async fn insert_link(
        &self,
        store: &C::Store,
        link_id: &LinkId,
        link: &str,
    ) -> Result<LinkRecord> {
        let record = LinkRecord::new(link_id.clone(), link);

        store
            .put_if_absent(
                &self.config.link_table,
                Key::new(LINK_KEY, link_id.as_str()),
                record.clone().into_document(),
            )
            .await
            .map_err(|e| match e {
                StoreError::ConditionFailed(_) => PersistenceError::KeyCollision {
                    kind: RecordKind::Link,
                    id: link_id.to_string(),
                },
                other => unexpected("insert link", other),
            })?;

        debug!(link_id = %link_id, "Stored new link");
        Ok(record)
    }
}

fn unexpected(operation: &str, err: StoreError) -> PersistenceError {
    warn!(operation, error = %err, "Store operation failed");
    PersistenceError::UnexpectedStore(err)
}

#[async_trait]
impl<C: Connector> PersistenceLayer for StorePersistenceLayer<C> {
    async fn connect(&self, options: ConnectionOptions) -> Result<()> {
        if self.is_connected() {
            return Err(PersistenceError::AlreadyConnected);
        }

        trace!(region = %options.region, endpoint = ?options.endpoint, "Connecting to store");
        let store = self.connector.connect(&options).await.map_err(|e| {
            warn!(error = %e, "Failed to connect to store");
            PersistenceError::Connection(e.to_string())
        })?;

        // Another caller may have connected while this one was awaiting.
        let mut handle = self.handle.write();
        if handle.is_some() {
            return Err(PersistenceError::AlreadyConnected);
        }
        *handle = Some(Arc::new(store));

        debug!("Connected to store");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        match self.handle.write().take() {
            Some(_) => {
                debug!("Disconnected from store");
                Ok(())
            }
            None => Err(PersistenceError::NotConnected),
        }
    }

    async fn check_and_add_pixel(
        &self,
        pixel: &PixelId,
        metadata: Metadata,
    ) -> Result<PixelRecord> {
        let store = self.store()?;
        trace!(pixel = %pixel, "Creating pixel");

        let record = PixelRecord::new(pixel.clone(), metadata);
        store
            .put_if_absent(
                &self.config.pixel_table,
                Key::new(PIXEL_KEY, pixel.as_str()),
                record.clone().into_document(),
            )
            .await
            .map_err(|e| match e {
                StoreError::ConditionFailed(_) => {
                    debug!(pixel = %pixel, "Pixel key collision");
                    PersistenceError::KeyCollision {
                        kind: RecordKind::Pixel,
                        id: pixel.to_string(),
                    }
                }
                other => unexpected("insert pixel", other),
            })?;

        debug!(pixel = %pixel, "Created pixel");
        Ok(record)
    }

    async fn log_pixel(&self, pixel: &PixelId) -> Result<PixelRecord> {
        let store = self.store()?;
        trace!(pixel = %pixel, "Logging pixel hit");

        let item = store
            .add_if_present(
                &self.config.pixel_table,
                Key::new(PIXEL_KEY, pixel.as_str()),
                PIXEL_COUNT,
                1,
            )
            .await
            .map_err(|e| match e {
                StoreError::ConditionFailed(_) => PersistenceError::NotFound {
                    kind: RecordKind::Pixel,
                    id: pixel.to_string(),
                },
                other => unexpected("increment pixel", other),
            })?;

        let record = PixelRecord::try_from(item).map_err(|e| unexpected("increment pixel", e))?;
        debug!(pixel = %pixel, count = record.count, "Logged pixel hit");
        Ok(record)
    }

    async fn check_and_add_link(&self, link_id: &LinkId, link: &str) -> Result<LinkRecord> {
        let store = self.store()?;
        trace!(link_id = %link_id, "Shortening link");

        if self.config.reuse_links {
            if let Some(existing) = self.find_existing_link(&store, link).await? {
                debug!(link_id = %existing.link_id, "Reusing existing link");
                return Ok(existing);
            }
        }

        self.insert_link(&store, link_id, link).await
    }

    async fn lookup_link(&self, link_id: &LinkId) -> Result<String> {
        let store = self.store()?;
        trace!(link_id = %link_id, "Looking up link");

        let item = store
            .get(&self.config.link_table, Key::new(LINK_KEY, link_id.as_str()))
            .await
            .map_err(|e| unexpected("get link", e))?;

        match item {
            Some(item) if !item.is_empty() => {
                let record = LinkRecord::try_from(item).map_err(|e| unexpected("get link", e))?;
                Ok(record.link)
            }
            _ => {
                trace!(link_id = %link_id, "Link not found");
                Err(PersistenceError::NotFound {
                    kind: RecordKind::Link,
                    id: link_id.to_string(),
                })
            }
        }
    }
}
