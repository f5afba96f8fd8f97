mod attribute;
mod provision;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_dynamodb::types::{AttributeValue as Av, ReturnValue};
use aws_sdk_dynamodb::Client;
use pxl_core::store::{Connector, DocumentStore, IndexQuery, Key, Result, StoreError};
use pxl_core::{ConnectionOptions, Document};
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

pub use attribute::{from_item, to_item};

const CONDITIONAL_CHECK_FAILED: &str = "ConditionalCheckFailedException";
const CREDENTIALS_PROVIDER_NAME: &str = "pxl-static";

/// DynamoDB implementation of [`DocumentStore`].
///
/// Tables are expected to use a single string hash key. The link reverse
/// index is a global secondary index, so index queries are eventually
/// consistent.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    /// Creates a store from an existing client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

pub(crate) fn map_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = format!("{operation}: {}", DisplayErrorContext(&err));

    match &err {
        SdkError::TimeoutError(_) => StoreError::Timeout(message),
        SdkError::DispatchFailure(_) => StoreError::Unavailable(message),
        _ if err.code() == Some(CONDITIONAL_CHECK_FAILED) => StoreError::ConditionFailed(message),
        _ => StoreError::Operation(message),
    }
}

#[async_trait]
impl DocumentStore for DynamoDbStore {
    async fn put_if_absent(&self, table: &str, key: Key<'_>, item: Document) -> Result<()> {
        trace!(table, key = key.value, "DynamoDB put_item");

        self.client
            .put_item()
            .table_name(table)
            .set_item(Some(to_item(item)))
            .condition_expression("attribute_not_exists(#k)")
            .expression_attribute_names("#k", key.attribute)
            .send()
            .await
            .map_err(|e| map_sdk_error("put_item", e))?;

        Ok(())
    }

    async fn add_if_present(
        &self,
        table: &str,
        key: Key<'_>,
        attribute: &str,
        delta: u64,
    ) -> Result<Document> {
        trace!(table, key = key.value, attribute, delta, "DynamoDB update_item");

        let output = self
            .client
            .update_item()
            .table_name(table)
            .key(key.attribute, Av::S(key.value.to_owned()))
            .condition_expression("attribute_exists(#k)")
            .update_expression("ADD #a :delta")
            .expression_attribute_names("#k", key.attribute)
            .expression_attribute_names("#a", attribute)
            .expression_attribute_values(":delta", Av::N(delta.to_string()))
            .return_values(ReturnValue::AllNew)
            .send()
            .await
            .map_err(|e| map_sdk_error("update_item", e))?;

        let Some(attributes) = output.attributes else {
            warn!(table, key = key.value, "update_item returned no attributes");
            return Err(StoreError::InvalidData(format!(
                "update of '{}' in table '{}' returned no attributes",
                key.value, table
            )));
        };

        from_item(attributes)
    }

    async fn get(&self, table: &str, key: Key<'_>) -> Result<Option<Document>> {
        trace!(table, key = key.value, "DynamoDB get_item");

        let output = self
            .client
            .get_item()
            .table_name(table)
            .key(key.attribute, Av::S(key.value.to_owned()))
            .send()
            .await
            .map_err(|e| map_sdk_error("get_item", e))?;

        output.item.map(from_item).transpose()
    }

    async fn query_index(&self, table: &str, query: IndexQuery<'_>) -> Result<Vec<Document>> {
        trace!(table, index = query.index, "DynamoDB query");

        let mut documents = Vec::new();
        let mut start_key = None;

        loop {
            let output = self
                .client
                .query()
                .table_name(table)
                .index_name(query.index)
                .key_condition_expression("#a = :v")
                .expression_attribute_names("#a", query.attribute)
                .expression_attribute_values(":v", Av::S(query.value.to_owned()))
                .set_exclusive_start_key(start_key)
                .send()
                .await
                .map_err(|e| map_sdk_error("query", e))?;

            for item in output.items.unwrap_or_default() {
                documents.push(from_item(item)?);
            }

            match output.last_evaluated_key {
                Some(key) if !key.is_empty() => start_key = Some(key),
                _ => break,
            }
        }

        debug!(table, index = query.index, matches = documents.len(), "DynamoDB query done");
        Ok(documents)
    }
}

/// Opens [`DynamoDbStore`] handles.
///
/// With `probe` enabled (the default) the endpoint is contacted once while
/// connecting, so an unreachable store is reported by `connect` instead of
/// by the first data operation.
#[derive(Debug, Clone, TypedBuilder)]
pub struct DynamoDbConnector {
    #[builder(default = true)]
    probe: bool,
}

impl Default for DynamoDbConnector {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[async_trait]
impl Connector for DynamoDbConnector {
    type Store = DynamoDbStore;

    async fn connect(&self, options: &ConnectionOptions) -> Result<DynamoDbStore> {
        options.validate().map_err(StoreError::Unavailable)?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(options.region.clone()));
        if let Some(endpoint) = &options.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some(credentials) = &options.credentials {
            loader = loader.credentials_provider(Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                None,
                None,
                CREDENTIALS_PROVIDER_NAME,
            ));
        }

        let store = DynamoDbStore::new(Client::new(&loader.load().await));

        if self.probe {
            store
                .client
                .list_tables()
                .limit(1)
                .send()
                .await
                .map_err(|e| map_sdk_error("list_tables", e))?;
        }

        debug!(region = %options.region, endpoint = ?options.endpoint, "DynamoDB client ready");
        Ok(store)
    }
}
