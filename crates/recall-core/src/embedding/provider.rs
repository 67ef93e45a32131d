//! EmbeddingProvider trait definition.
//!
//! Uses native async fn in traits (RPITIT, Rust 2024 edition). The trait
//! is implemented per backend in `recall-infra`; use
//! [`super::BoxEmbeddingProvider`] when the backend is chosen at runtime.

use recall_types::error::EmbeddingError;

/// Trait for embedding backends (Ollama, OpenAI, Voyage).
///
/// All vectors an instance emits have exactly `dimension()` elements;
/// that value is fixed at construction and drives the vector store schema.
/// Methods take `&self` and implementations hold no interior locks, so
/// concurrent calls from independent tasks are allowed.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text into a vector of `dimension()` floats.
    ///
    /// Empty or whitespace-only text is rejected with
    /// [`EmbeddingError::InvalidInput`] before any network call.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, EmbeddingError>> + Send;

    /// Embed several texts, returning vectors in input order, one per text.
    ///
    /// Partial failure fails the whole call; callers needing partial
    /// tolerance implement it above this layer. An empty slice yields an
    /// empty vec.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, EmbeddingError>> + Send;

    /// The model used for embeddings (e.g., "nomic-embed-text").
    fn model_name(&self) -> &str;

    /// The fixed length of vectors this provider emits.
    fn dimension(&self) -> usize;
}
