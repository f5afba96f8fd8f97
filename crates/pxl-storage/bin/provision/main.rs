mod cli;

use crate::cli::CLI;
use clap::Parser;
use pxl_storage::{Connector, DynamoDbConnector};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = CLI::try_parse()?;
    let options = config.connection_options();
    let tables = config.persistence_config();

    info!(
        region = %options.region,
        endpoint = ?options.endpoint,
        pixel_table = %tables.pixel_table,
        link_table = %tables.link_table,
        link_index = %tables.link_index,
        "provisioning pxl tables"
    );

    let store = DynamoDbConnector::default().connect(&options).await?;
    store.create_tables(&tables).await?;

    info!("pxl tables are ready");
    Ok(())
}
