//! Configuration for the persistence layer and its store connection.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

pub const DEFAULT_PIXEL_TABLE: &str = "pxls";
pub const DEFAULT_LINK_TABLE: &str = "links";
pub const DEFAULT_LINK_INDEX: &str = "link";

pub const LOCAL_REGION: &str = "localhost";
pub const LOCAL_ENDPOINT: &str = "http://localhost:8000";
pub const LOCAL_ACCESS_KEY_ID: &str = "MOCK_ACCESS_KEY_ID";
pub const LOCAL_SECRET_ACCESS_KEY: &str = "MOCK_SECRET_ACCESS_KEY";

/// Table layout and behavior of the persistence layer.
///
/// # Example
///
/// ```rust
/// use pxl_core::PersistenceConfig;
///
/// let config = PersistenceConfig::builder()
///     .pixel_table("pxl-test-pxls".to_string())
///     .reuse_links(false)
///     .build();
///
/// assert_eq!(config.link_table, "links");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Table holding pixel records, keyed by `pxl`.
    #[builder(default = DEFAULT_PIXEL_TABLE.to_string())]
    pub pixel_table: String,

    /// Table holding link records, keyed by `linkId`.
    #[builder(default = DEFAULT_LINK_TABLE.to_string())]
    pub link_table: String,

    /// Secondary index on the link table, keyed by `link`.
    #[builder(default = DEFAULT_LINK_INDEX.to_string())]
    pub link_index: String,

    /// Return the existing short link when the same long-form link is
    /// shortened again, instead of always creating a new one.
    #[builder(default = true)]
    pub reuse_links: bool,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Static access credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// Parameters for establishing a store handle.
///
/// Without explicit `credentials` the backend falls back to its default
/// credential chain.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder, Serialize, Deserialize)]
pub struct ConnectionOptions {
    #[builder(setter(into))]
    pub region: String,

    #[builder(default, setter(strip_option, into))]
    #[serde(default)]
    pub endpoint: Option<String>,

    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

impl ConnectionOptions {
    /// Options for a DynamoDB Local instance on its default port.
    pub fn local() -> Self {
        Self::builder()
            .region(LOCAL_REGION)
            .endpoint(LOCAL_ENDPOINT)
            .credentials(Credentials::new(
                LOCAL_ACCESS_KEY_ID,
                LOCAL_SECRET_ACCESS_KEY,
            ))
            .build()
    }

    /// Checks that the options can describe a reachable store at all.
    pub fn validate(&self) -> Result<(), String> {
        if self.region.trim().is_empty() {
            return Err("region cannot be empty".to_string());
        }

        if let Some(endpoint) = &self.endpoint {
            let Some((scheme, rest)) = endpoint.split_once("://") else {
                return Err(format!("endpoint must have a scheme and host: {endpoint}"));
            };
            if rest.is_empty() {
                return Err(format!("endpoint must have a host: {endpoint}"));
            }
            let scheme = scheme.to_ascii_lowercase();
            if scheme != "http" && scheme != "https" {
                return Err(format!("endpoint scheme must be http or https: {scheme}"));
            }
        }

        Ok(())
    }
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self::local()
    }
}
