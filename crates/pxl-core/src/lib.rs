//! Core types and traits for the pxl persistence layer.
//!
//! This crate provides the record types, the error vocabulary, the
//! [`PersistenceLayer`] contract consumed by callers and the
//! [`DocumentStore`] contract a key-value backend has to satisfy.

pub mod config;
pub mod error;
pub mod persistence;
pub mod record;
pub mod store;

pub use config::{ConnectionOptions, Credentials, PersistenceConfig};
pub use error::{PersistenceError, RecordKind, Result};
pub use persistence::PersistenceLayer;
pub use record::{Document, LinkId, LinkRecord, Metadata, PixelId, PixelRecord};
pub use store::{Connector, DocumentStore, IndexQuery, Key, StoreError};
