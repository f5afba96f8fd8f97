//! Pixel tracking and link shortening on top of a [`PersistenceLayer`].
//!
//! [`Pxl`] owns identifier generation and hands the generated keys to the
//! persistence layer, retrying when a generated key is already taken.

pub mod client;
pub mod generator;

pub use client::{Pxl, DEFAULT_MAX_ATTEMPTS};
pub use generator::seq::SeqGenerator;
pub use generator::Generator;
pub use pxl_core::{
    ConnectionOptions, LinkId, LinkRecord, Metadata, PersistenceConfig, PersistenceError,
    PersistenceLayer, PixelId, PixelRecord, Result,
};
