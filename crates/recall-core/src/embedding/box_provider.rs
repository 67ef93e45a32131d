//! BoxEmbeddingProvider -- object-safe dynamic dispatch wrapper.
//!
//! `EmbeddingProvider` uses RPITIT, so it cannot be a trait object
//! directly. The usual three-step pattern applies:
//! 1. Define an object-safe `EmbeddingProviderDyn` trait with boxed futures
//! 2. Blanket-impl it for all `T: EmbeddingProvider`
//! 3. `BoxEmbeddingProvider` wraps `Box<dyn EmbeddingProviderDyn>` and
//!    implements `EmbeddingProvider` itself by delegation

use std::future::Future;
use std::pin::Pin;

use recall_types::error::EmbeddingError;

use super::provider::EmbeddingProvider;

/// Object-safe version of [`EmbeddingProvider`] with boxed futures.
///
/// Exists solely to enable dynamic dispatch; a blanket implementation
/// covers every `EmbeddingProvider`.
pub trait EmbeddingProviderDyn: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, EmbeddingError>> + Send + 'a>>;

    fn embed_batch_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send + 'a>>;

    fn model_name_dyn(&self) -> &str;

    fn dimension_dyn(&self) -> usize;
}

impl<T: EmbeddingProvider> EmbeddingProviderDyn for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, EmbeddingError>> + Send + 'a>> {
        Box::pin(self.embed(text))
    }

    fn embed_batch_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send + 'a>> {
        Box::pin(self.embed_batch(texts))
    }

    fn model_name_dyn(&self) -> &str {
        self.model_name()
    }

    fn dimension_dyn(&self) -> usize {
        self.dimension()
    }
}

/// Type-erased embedding provider for runtime backend selection.
///
/// Produced by the provider factory in `recall-infra` from a
/// `RecallConfig`. Implements [`EmbeddingProvider`] itself, so anything
/// generic over the trait accepts it unchanged.
pub struct BoxEmbeddingProvider {
    inner: Box<dyn EmbeddingProviderDyn>,
}

impl BoxEmbeddingProvider {
    /// Wrap a concrete provider in a type-erased box.
    pub fn new<T: EmbeddingProvider + 'static>(provider: T) -> Self {
        Self {
            inner: Box::new(provider),
        }
    }
}

impl EmbeddingProvider for BoxEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.inner.embed_boxed(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.inner.embed_batch_boxed(texts).await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name_dyn()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension_dyn()
    }
}
