pub mod seq;

/// Produces candidate identifiers for pixels and short links.
///
/// Generators never talk to storage. A generated identifier may already be
/// taken, in which case [`Pxl`](crate::Pxl) asks for another one.
pub trait Generator: Send + Sync + 'static {
    type Output: Into<String>;

    fn generate(&self) -> Self::Output;
}
