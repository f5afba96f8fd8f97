use crate::config::ConnectionOptions;
use crate::error::Result;
use crate::record::{LinkId, LinkRecord, Metadata, PixelId, PixelRecord};
use async_trait::async_trait;

/// The capability set a pixel store backend offers to the calling library.
///
/// Identifiers are always produced by the caller. The layer only guarantees
/// that they are claimed at most once.
#[async_trait]
pub trait PersistenceLayer: Send + Sync + 'static {
    /// Establishes the store handle.
    ///
    /// Returns `Err(AlreadyConnected)` if a handle is active and
    /// `Err(Connection)` if the store cannot be reached.
    async fn connect(&self, options: ConnectionOptions) -> Result<()>;

    /// Releases the store handle. Returns `Err(NotConnected)` if there is none.
    async fn disconnect(&self) -> Result<()>;

    /// Inserts a new pixel with a zero counter and returns it.
    /// Returns `Err(KeyCollision)` if the identifier is already taken.
    async fn check_and_add_pixel(&self, pixel: &PixelId, metadata: Metadata)
        -> Result<PixelRecord>;

    /// Adds one hit to an existing pixel and returns the updated record.
    /// Returns `Err(NotFound)` if the pixel does not exist.
    async fn log_pixel(&self, pixel: &PixelId) -> Result<PixelRecord>;

    /// Stores a new short link, or returns the existing one for `link` when
    /// link reuse is enabled.
    /// Returns `Err(KeyCollision)` if `link_id` is already taken.
    async fn check_and_add_link(&self, link_id: &LinkId, link: &str) -> Result<LinkRecord>;

    /// Resolves a short link to its long-form link.
    /// Returns `Err(NotFound)` if the link does not exist.
    async fn lookup_link(&self, link_id: &LinkId) -> Result<String>;
}
