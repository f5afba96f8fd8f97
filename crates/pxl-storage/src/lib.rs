//! Store backends and the persistence layer built on top of them.
//!
//! [`StorePersistenceLayer`] implements the [`PersistenceLayer`] contract for
//! any [`Connector`]. Two backends are provided: an in-memory store for tests
//! and single-process use, and DynamoDB.
//!
//! # Example
//!
//! ```rust
//! use pxl_core::{ConnectionOptions, Metadata, PersistenceConfig, PersistenceLayer, PixelId};
//! use pxl_storage::{InMemoryConnector, StorePersistenceLayer};
//!
//! # async fn example() -> pxl_core::Result<()> {
//! let layer = StorePersistenceLayer::new(InMemoryConnector::new(), PersistenceConfig::default());
//! layer.connect(ConnectionOptions::local()).await?;
//!
//! let pixel = layer
//!     .check_and_add_pixel(&PixelId::new("abc"), Metadata::new())
//!     .await?;
//! assert_eq!(pixel.count, 0);
//!
//! let pixel = layer.log_pixel(&PixelId::new("abc")).await?;
//! assert_eq!(pixel.count, 1);
//!
//! layer.disconnect().await?;
//! # Ok(())
//! # }
//! ```

pub mod dynamodb;
pub mod layer;
pub mod memory;

pub use dynamodb::{DynamoDbConnector, DynamoDbStore};
pub use layer::StorePersistenceLayer;
pub use memory::{InMemoryConnector, InMemoryStore};
pub use pxl_core::{Connector, DocumentStore, PersistenceLayer, StoreError};
