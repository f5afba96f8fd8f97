use crate::generator::Generator;
use pxl_core::{
    ConnectionOptions, LinkId, LinkRecord, Metadata, PersistenceLayer, PixelId, PixelRecord,
    Result,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Number of identifiers tried before a key collision is reported.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Creates pixels and short links with generated identifiers.
///
/// The persistence layer rejects identifiers that are already taken. `Pxl`
/// reacts by generating a new identifier, up to `max_attempts` times per
/// call. Every other error is returned as is.
#[derive(Debug, Clone)]
pub struct Pxl<P, G> {
    layer: Arc<P>,
    generator: Arc<G>,
    max_attempts: usize,
}

impl<P: PersistenceLayer, G: Generator> Pxl<P, G> {
    pub fn new(layer: P, generator: G) -> Self {
        Self {
            layer: Arc::new(layer),
            generator: Arc::new(generator),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Sets how many identifiers are tried per call. Values below one are
    /// treated as one.
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn layer(&self) -> &P {
        &self.layer
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub async fn connect(&self, options: ConnectionOptions) -> Result<()> {
        self.layer.connect(options).await
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.layer.disconnect().await
    }

    /// Creates a pixel with a freshly generated identifier.
    pub async fn create_pixel(&self, metadata: Metadata) -> Result<PixelRecord> {
        self.with_generated_key("create_pixel", |id| {
            let metadata = metadata.clone();
            async move {
                self.layer
                    .check_and_add_pixel(&PixelId::new(id), metadata)
                    .await
            }
        })
        .await
    }

    /// Records one hit on `pixel`.
    pub async fn log_pixel(&self, pixel: &PixelId) -> Result<PixelRecord> {
        self.layer.log_pixel(pixel).await
    }

    /// Shortens `link`.
    ///
    /// If the layer reuses links, an existing short link for the same target
    /// is returned instead of a new one.
    pub async fn shorten(&self, link: &str) -> Result<LinkRecord> {
        self.with_generated_key("shorten", |id| async move {
            self.layer.check_and_add_link(&LinkId::new(id), link).await
        })
        .await
    }

    /// Resolves a short link to its target.
    pub async fn unshorten(&self, link_id: &LinkId) -> Result<String> {
        self.layer.lookup_link(link_id).await
    }

    async fn with_generated_key<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut tries = 1;
        loop {
            let id: String = self.generator.generate().into();
            match attempt(id).await {
                Err(e) if e.is_key_collision() && tries < self.max_attempts => {
                    debug!(operation, tries, error = %e, "Generated key is taken, retrying");
                    tries += 1;
                }
                Err(e) if e.is_key_collision() => {
                    warn!(operation, tries, "Every generated key was taken");
                    return Err(e);
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::seq::SeqGenerator;
    use pxl_core::{PersistenceConfig, PersistenceError, RecordKind};
    use pxl_storage::{InMemoryConnector, StorePersistenceLayer};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type MemoryLayer = StorePersistenceLayer<InMemoryConnector>;

    /// Hands out a fixed list of identifiers, repeating the last one.
    struct ScriptedGenerator {
        ids: Vec<&'static str>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        fn new(ids: Vec<&'static str>) -> Self {
            Self {
                ids,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Generator for ScriptedGenerator {
        type Output = &'static str;

        fn generate(&self) -> &'static str {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            self.ids[i.min(self.ids.len() - 1)]
        }
    }

    fn memory_layer(config: PersistenceConfig) -> MemoryLayer {
        StorePersistenceLayer::new(InMemoryConnector::new(), config)
    }

    async fn connected<G: Generator>(generator: G) -> Pxl<MemoryLayer, G> {
        let pxl = Pxl::new(memory_layer(PersistenceConfig::default()), generator);
        pxl.connect(ConnectionOptions::local()).await.unwrap();
        pxl
    }

    #[tokio::test]
    async fn creates_and_logs_a_pixel() {
        let pxl = connected(SeqGenerator::with_prefix("px")).await;
        let mut metadata = Metadata::new();
        metadata.insert("campaign".to_string(), json!("spring"));

        let created = pxl.create_pixel(metadata).await.unwrap();
        assert_eq!(created.pixel.as_str(), "px000000");
        assert_eq!(created.count, 0);

        let logged = pxl.log_pixel(&created.pixel).await.unwrap();
        assert_eq!(logged.count, 1);
        assert_eq!(logged.metadata["campaign"], json!("spring"));

        pxl.disconnect().await.unwrap();
    }

    #[tokio::test]
    async fn retries_a_colliding_pixel_key() {
        let pxl = connected(ScriptedGenerator::new(vec!["a", "a", "b"])).await;

        let first = pxl.create_pixel(Metadata::new()).await.unwrap();
        let second = pxl.create_pixel(Metadata::new()).await.unwrap();

        assert_eq!(first.pixel.as_str(), "a");
        assert_eq!(second.pixel.as_str(), "b");
        assert_eq!(pxl.generator().calls(), 3);

        let logged = pxl.log_pixel(&second.pixel).await.unwrap();
        assert_eq!(logged.count, 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let pxl = connected(ScriptedGenerator::new(vec!["a"])).await;
        pxl.create_pixel(Metadata::new()).await.unwrap();

        let err = pxl.create_pixel(Metadata::new()).await.unwrap_err();

        assert!(matches!(
            err,
            PersistenceError::KeyCollision {
                kind: RecordKind::Pixel,
                ..
            }
        ));
        assert_eq!(pxl.generator().calls(), 1 + DEFAULT_MAX_ATTEMPTS);
    }

    #[tokio::test]
    async fn single_attempt_does_not_retry() {
        let pxl = connected(ScriptedGenerator::new(vec!["a", "a", "b"]))
            .await
            .with_max_attempts(0);
        pxl.create_pixel(Metadata::new()).await.unwrap();

        let err = pxl.create_pixel(Metadata::new()).await.unwrap_err();

        assert!(err.is_key_collision());
        assert_eq!(pxl.generator().calls(), 2);
    }

    #[tokio::test]
    async fn shortens_and_unshortens_a_link() {
        let pxl = connected(SeqGenerator::with_prefix("l")).await;

        let record = pxl.shorten("https://example.com").await.unwrap();
        assert_eq!(record.link_id.as_str(), "l000000");

        let link = pxl.unshorten(&record.link_id).await.unwrap();
        assert_eq!(link, "https://example.com");

        let err = pxl.unshorten(&LinkId::new("missing")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn reuses_shortened_links() {
        let pxl = connected(SeqGenerator::with_prefix("l")).await;

        let first = pxl.shorten("https://example.com").await.unwrap();
        let second = pxl.shorten("https://example.com").await.unwrap();
        let other = pxl.shorten("https://other.example").await.unwrap();

        assert_eq!(first.link_id, second.link_id);
        assert_ne!(first.link_id, other.link_id);
    }

    #[tokio::test]
    async fn retries_a_colliding_link_key() {
        let pxl = connected(ScriptedGenerator::new(vec!["x", "x", "y"])).await;

        pxl.shorten("https://one.example").await.unwrap();
        let second = pxl.shorten("https://two.example").await.unwrap();

        assert_eq!(second.link_id.as_str(), "y");
        assert_eq!(
            pxl.unshorten(&second.link_id).await.unwrap(),
            "https://two.example"
        );
    }

    #[tokio::test]
    async fn errors_other_than_collisions_are_not_retried() {
        let pxl = Pxl::new(
            memory_layer(PersistenceConfig::default()),
            ScriptedGenerator::new(vec!["a"]),
        );

        let err = pxl.create_pixel(Metadata::new()).await.unwrap_err();

        assert!(matches!(err, PersistenceError::NotConnected));
        assert_eq!(pxl.generator().calls(), 1);
    }

    #[tokio::test]
    async fn logging_an_unknown_pixel_fails() {
        let pxl = connected(SeqGenerator::with_prefix("px")).await;

        let err = pxl.log_pixel(&PixelId::new("missing")).await.unwrap_err();

        assert!(err.is_not_found());
    }
}
