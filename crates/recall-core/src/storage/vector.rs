//! Vector store trait.
//!
//! Persists (document, embedding) tuples in an on-disk ANN index and
//! serves similarity search over them. The LanceDB implementation lives
//! in `recall-infra`.

use recall_types::document::{Document, SearchFilter, SearchResult};
use recall_types::error::StorageError;

/// Trait for durable vector-indexed document storage.
///
/// Each call is independently atomic and durable: once `add` returns, the
/// document survives a process restart and is immediately searchable.
/// There are no multi-operation transactions.
pub trait VectorStore: Send + Sync {
    /// Persist a document with its embedding; returns the document id.
    ///
    /// Fails with [`StorageError::DimensionMismatch`] (leaving the store
    /// unchanged) when `embedding.len() != dimension()`. Adding an id that
    /// already exists replaces the stored tuple rather than duplicating it.
    fn add(
        &self,
        document: &Document,
        embedding: &[f32],
    ) -> impl std::future::Future<Output = Result<String, StorageError>> + Send;

    /// Persist several documents at once. Lengths must agree pairwise.
    fn add_batch(
        &self,
        documents: &[Document],
        embeddings: &[Vec<f32>],
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Nearest-neighbor search, descending by score.
    ///
    /// `filter` predicates apply before the limit. Ties break by insertion
    /// order (earlier-added first). An empty store or an unmatched filter
    /// yields an empty vec, not an error.
    fn search(
        &self,
        query: &[f32],
        limit: usize,
        filter: Option<&SearchFilter>,
    ) -> impl std::future::Future<Output = Result<Vec<SearchResult>, StorageError>> + Send;

    /// Fetch a document by id.
    fn get(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Document>, StorageError>> + Send;

    /// Remove a document. Succeeds as a no-op when the id is absent.
    fn delete(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Remove every document derived from one conversation; returns the
    /// number removed.
    fn delete_by_conversation(
        &self,
        conversation_id: &str,
    ) -> impl std::future::Future<Output = Result<u64, StorageError>> + Send;

    /// Total number of stored documents.
    fn count(&self) -> impl std::future::Future<Output = Result<u64, StorageError>> + Send;

    /// The embedding dimension this store was configured with.
    fn dimension(&self) -> usize;
}
