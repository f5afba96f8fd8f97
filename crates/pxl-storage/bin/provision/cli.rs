use clap::Parser;
use pxl_core::config::{DEFAULT_LINK_INDEX, DEFAULT_LINK_TABLE, DEFAULT_PIXEL_TABLE, LOCAL_REGION};
use pxl_core::{ConnectionOptions, Credentials, PersistenceConfig};

pub const REGION_ENV: &str = "PXL_DYNAMODB_REGION";
pub const ENDPOINT_ENV: &str = "PXL_DYNAMODB_ENDPOINT";
pub const ACCESS_KEY_ID_ENV: &str = "PXL_DYNAMODB_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_ENV: &str = "PXL_DYNAMODB_SECRET_ACCESS_KEY";
pub const PIXEL_TABLE_ENV: &str = "PXL_PIXEL_TABLE";
pub const LINK_TABLE_ENV: &str = "PXL_LINK_TABLE";
pub const LINK_INDEX_ENV: &str = "PXL_LINK_INDEX";

#[derive(Debug, Parser)]
#[command(name = "pxl-provision", about = "Create the pxl DynamoDB tables")]
pub struct CLI {
    #[arg(long, env = REGION_ENV, default_value = LOCAL_REGION)]
    pub region: String,

    #[arg(long, env = ENDPOINT_ENV)]
    pub endpoint: Option<String>,

    #[arg(long, env = ACCESS_KEY_ID_ENV, requires = "secret_access_key")]
    pub access_key_id: Option<String>,

    #[arg(
        long,
        env = SECRET_ACCESS_KEY_ENV,
        requires = "access_key_id",
        hide_env_values = true
    )]
    pub secret_access_key: Option<String>,

    #[arg(long, env = PIXEL_TABLE_ENV, default_value = DEFAULT_PIXEL_TABLE)]
    pub pixel_table: String,

    #[arg(long, env = LINK_TABLE_ENV, default_value = DEFAULT_LINK_TABLE)]
    pub link_table: String,

    #[arg(long, env = LINK_INDEX_ENV, default_value = DEFAULT_LINK_INDEX)]
    pub link_index: String,
}

impl CLI {
    pub fn connection_options(&self) -> ConnectionOptions {
        let credentials = self
            .access_key_id
            .as_ref()
            .zip(self.secret_access_key.as_ref())
            .map(|(id, secret)| Credentials::new(id, secret));

        ConnectionOptions {
            region: self.region.clone(),
            endpoint: self.endpoint.clone(),
            credentials,
        }
    }

    pub fn persistence_config(&self) -> PersistenceConfig {
        PersistenceConfig::builder()
            .pixel_table(self.pixel_table.clone())
            .link_table(self.link_table.clone())
            .link_index(self.link_index.clone())
            .build()
    }
}
