use crate::store::StoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Display;

/// A schemaless item as exchanged with a [`DocumentStore`][crate::DocumentStore].
pub type Document = Map<String, Value>;

/// Caller-supplied pixel metadata.
pub type Metadata = Map<String, Value>;

/// Attribute holding the pixel identifier.
pub const PIXEL_KEY: &str = "pxl";
/// Attribute holding the pixel hit counter.
pub const PIXEL_COUNT: &str = "count";
/// Attribute holding the short-link identifier.
pub const LINK_KEY: &str = "linkId";
/// Attribute holding the long-form link.
pub const LINK_VALUE: &str = "link";

/// An opaque pixel identifier, produced by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PixelId(String);

impl PixelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PixelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PixelId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An opaque short-link identifier, produced by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkId(String);

impl LinkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LinkId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A stored tracking pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelRecord {
    pub pixel: PixelId,
    /// Number of logged hits. Starts at zero and only ever grows.
    pub count: u64,
    /// Everything else the caller attached when the pixel was created.
    pub metadata: Metadata,
}

impl PixelRecord {
    /// Builds a fresh record with a zero counter.
    ///
    /// `pxl` and `count` entries in `metadata` are shadowed by the record's own
    /// identifier and counter.
    pub fn new(pixel: PixelId, mut metadata: Metadata) -> Self {
        metadata.remove(PIXEL_KEY);
        metadata.remove(PIXEL_COUNT);
        Self {
            pixel,
            count: 0,
            metadata,
        }
    }

    pub fn into_document(self) -> Document {
        let mut document = self.metadata;
        document.insert(PIXEL_KEY.to_string(), Value::String(self.pixel.0));
        document.insert(PIXEL_COUNT.to_string(), Value::from(self.count));
        document
    }
}

impl TryFrom<Document> for PixelRecord {
    type Error = StoreError;

    fn try_from(mut document: Document) -> Result<Self, Self::Error> {
        let pixel = match document.remove(PIXEL_KEY) {
            Some(Value::String(pixel)) => PixelId(pixel),
            other => {
                return Err(StoreError::InvalidData(format!(
                    "pixel record has no string '{PIXEL_KEY}' attribute: {other:?}"
                )))
            }
        };

        let count = match document.remove(PIXEL_COUNT) {
            Some(value) => value.as_u64().ok_or_else(|| {
                StoreError::InvalidData(format!(
                    "pixel '{pixel}' has a non-counter '{PIXEL_COUNT}' attribute: {value}"
                ))
            })?,
            None => 0,
        };

        Ok(Self {
            pixel,
            count,
            metadata: document,
        })
    }
}

/// A stored short link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    #[serde(rename = "linkId")]
    pub link_id: LinkId,
    pub link: String,
}

impl LinkRecord {
    pub fn new(link_id: LinkId, link: impl Into<String>) -> Self {
        Self {
            link_id,
            link: link.into(),
        }
    }

    pub fn into_document(self) -> Document {
        let mut document = Document::new();
        document.insert(LINK_KEY.to_string(), Value::String(self.link_id.0));
        document.insert(LINK_VALUE.to_string(), Value::String(self.link));
        document
    }
}

impl TryFrom<Document> for LinkRecord {
    type Error = StoreError;

    fn try_from(document: Document) -> Result<Self, Self::Error> {
        serde_json::from_value(Value::Object(document))
            .map_err(|e| StoreError::InvalidData(format!("malformed link record: {e}")))
    }
}
