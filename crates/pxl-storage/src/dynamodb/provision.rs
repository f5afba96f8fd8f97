//! Table provisioning for the DynamoDB backend.

use super::{map_sdk_error, DynamoDbStore};
use aws_sdk_dynamodb::error::{BuildError, ProvideErrorMetadata};
use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, GlobalSecondaryIndex, KeySchemaElement, KeyType, Projection,
    ProjectionType, ScalarAttributeType, TableDescription, TableStatus,
};
use pxl_core::record::{LINK_KEY, LINK_VALUE, PIXEL_KEY};
use pxl_core::store::{Result, StoreError};
use pxl_core::PersistenceConfig;
use std::time::Duration;
use tracing::{debug, info, warn};

const RESOURCE_IN_USE: &str = "ResourceInUseException";
const ACTIVE_POLL_INTERVAL: Duration = Duration::from_millis(500);
const ACTIVE_POLL_ATTEMPTS: usize = 120;

fn map_build_error(err: BuildError) -> StoreError {
    StoreError::Operation(format!("invalid table definition: {err}"))
}

fn string_attribute(name: &str) -> Result<AttributeDefinition> {
    AttributeDefinition::builder()
        .attribute_name(name)
        .attribute_type(ScalarAttributeType::S)
        .build()
        .map_err(map_build_error)
}

fn hash_key(name: &str) -> Result<KeySchemaElement> {
    KeySchemaElement::builder()
        .attribute_name(name)
        .key_type(KeyType::Hash)
        .build()
        .map_err(map_build_error)
}

/// A global secondary index with a single string hash key.
struct IndexDefinition<'a> {
    name: &'a str,
    key: &'a str,
}

fn has_index(table: &TableDescription, index: &str) -> bool {
    table
        .global_secondary_indexes()
        .iter()
        .any(|gsi| gsi.index_name() == Some(index))
}

impl DynamoDbStore {
    /// Creates the pixel and link tables described by `config`.
    ///
    /// Tables that already exist are left untouched. Returns once both tables
    /// are active. Fails if an existing link table lacks the link index.
    pub async fn create_tables(&self, config: &PersistenceConfig) -> Result<()> {
        self.create_table(&config.pixel_table, PIXEL_KEY, None).await?;
        self.create_table(
            &config.link_table,
            LINK_KEY,
            Some(IndexDefinition {
                name: &config.link_index,
                key: LINK_VALUE,
            }),
        )
        .await?;

        self.wait_until_active(&config.pixel_table).await?;
        let links = self.wait_until_active(&config.link_table).await?;

        if !has_index(&links, &config.link_index) {
            warn!(
                table = %config.link_table,
                index = %config.link_index,
                "Existing link table has no link index"
            );
            return Err(StoreError::Operation(format!(
                "table '{}' exists without index '{}'",
                config.link_table, config.link_index
            )));
        }
        Ok(())
    }

    async fn create_table(
        &self,
        table: &str,
        key: &str,
        index: Option<IndexDefinition<'_>>,
    ) -> Result<()> {
        let mut request = self
            .client
            .create_table()
            .table_name(table)
            .billing_mode(BillingMode::PayPerRequest)
            .attribute_definitions(string_attribute(key)?)
            .key_schema(hash_key(key)?);

        if let Some(index) = index {
            let gsi = GlobalSecondaryIndex::builder()
                .index_name(index.name)
                .key_schema(hash_key(index.key)?)
                .projection(
                    Projection::builder()
                        .projection_type(ProjectionType::All)
                        .build(),
                )
                .build()
                .map_err(map_build_error)?;

            request = request
                .attribute_definitions(string_attribute(index.key)?)
                .global_secondary_indexes(gsi);
        }

        match request.send().await {
            Ok(_) => {
                info!(table, "Created table");
                Ok(())
            }
            Err(e) if e.code() == Some(RESOURCE_IN_USE) => {
                debug!(table, "Table already exists");
                Ok(())
            }
            Err(e) => Err(map_sdk_error("create_table", e)),
        }
    }

    async fn wait_until_active(&self, table: &str) -> Result<TableDescription> {
        for _ in 0..ACTIVE_POLL_ATTEMPTS {
            let output = self
                .client
                .describe_table()
                .table_name(table)
                .send()
                .await
                .map_err(|e| map_sdk_error("describe_table", e))?;

            let description = output.table;
            let status = description.as_ref().and_then(|t| t.table_status()).cloned();
            if let (Some(description), Some(TableStatus::Active)) = (description, &status) {
                return Ok(description);
            }

            debug!(table, status = ?status, "Waiting for table to become active");
            tokio::time::sleep(ACTIVE_POLL_INTERVAL).await;
        }

        Err(StoreError::Timeout(format!("table '{table}' did not become active")))
    }
}
