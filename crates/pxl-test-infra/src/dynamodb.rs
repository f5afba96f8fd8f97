use crate::Result;
use pxl_core::config::{LOCAL_ACCESS_KEY_ID, LOCAL_REGION, LOCAL_SECRET_ACCESS_KEY};
use pxl_core::{ConnectionOptions, Credentials};
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const DYNAMODB_LOCAL_PORT: u16 = 8000;

#[derive(Debug, Clone, TypedBuilder)]
pub struct DynamoDbLocalConfig {
    #[builder(default = "amazon/dynamodb-local".to_string())]
    image: String,
    #[builder(default = "2.5.4".to_string())]
    tag: String,
    #[builder(default = LOCAL_REGION.to_string())]
    region: String,
}

impl Default for DynamoDbLocalConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Test fixture for a disposable, in-memory DynamoDB Local server.
pub struct DynamoDbLocal {
    container: ContainerAsync<GenericImage>,
    config: DynamoDbLocalConfig,
}

impl DynamoDbLocal {
    /// Starts a DynamoDB Local container suitable for integration tests.
    pub async fn new(config: DynamoDbLocalConfig) -> Result<Self> {
        let container = GenericImage::new(config.image.as_str(), config.tag.as_str())
            .with_exposed_port(DYNAMODB_LOCAL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Initializing DynamoDB Local"))
            .with_cmd(["-jar", "DynamoDBLocal.jar", "-inMemory", "-sharedDb"])
            .start()
            .await?;

        Ok(Self { container, config })
    }

    pub async fn host(&self) -> Result<String> {
        let host = self.container.get_host().await?.to_string();
        match host.as_str() {
            "localhost" => Ok(String::from("127.0.0.1")),
            _ => Ok(host),
        }
    }

    pub async fn port(&self) -> Result<u16> {
        Ok(self
            .container
            .get_host_port_ipv4(DYNAMODB_LOCAL_PORT)
            .await?)
    }

    pub async fn endpoint(&self) -> Result<String> {
        let host = self.host().await?;
        let port = self.port().await?;
        Ok(format!("http://{host}:{port}"))
    }

    /// Connection options pointing at this server, with the mock credentials
    /// DynamoDB Local accepts.
    pub async fn connection_options(&self) -> Result<ConnectionOptions> {
        Ok(ConnectionOptions::builder()
            .region(self.config.region.as_str())
            .endpoint(self.endpoint().await?)
            .credentials(Credentials::new(
                LOCAL_ACCESS_KEY_ID,
                LOCAL_SECRET_ACCESS_KEY,
            ))
            .build())
    }

    /// Returns the underlying container reference.
    pub fn container(&self) -> &ContainerAsync<GenericImage> {
        &self.container
    }
}
