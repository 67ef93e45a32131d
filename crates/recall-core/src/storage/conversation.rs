//! Conversation store trait.
//!
//! Persists raw conversation threads independently of embeddings and
//! tracks which ones the pipeline has indexed. The SQLite + JSON-file
//! implementation lives in `recall-infra`.

use chrono::{DateTime, Utc};

use recall_types::conversation::{Conversation, ConversationStats};
use recall_types::document::Source;
use recall_types::error::StorageError;

/// Trait for durable conversation storage with incremental-indexing
/// bookkeeping.
///
/// Single save/mark calls are atomic; concurrent writes to the same id are
/// last-writer-wins. The `indexed_at` flag moves only unset -> set, through
/// [`ConversationStore::mark_indexed`].
pub trait ConversationStore: Send + Sync {
    /// Upsert by id; durable on return.
    ///
    /// Re-saving an existing id overwrites messages and metadata without
    /// creating a second entry. The passed object's `indexed_at` is taken
    /// as-is -- the caller decides whether to preserve it.
    fn save(
        &self,
        conversation: &Conversation,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Fetch a conversation by id.
    fn get(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<Option<Conversation>, StorageError>> + Send;

    /// Delete a conversation; returns whether it existed.
    fn delete(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<bool, StorageError>> + Send;

    /// Page through every conversation, most recently updated first.
    fn list_all(
        &self,
        limit: usize,
        offset: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, StorageError>> + Send;

    /// All conversations for a project, `created_at` ascending.
    fn list_by_project(
        &self,
        project_path: &str,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, StorageError>> + Send;

    /// Conversations created within `[start, end]` inclusive, newest
    /// first, optionally restricted to one source.
    fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        source: Option<Source>,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, StorageError>> + Send;

    /// Conversations not yet indexed, `created_at` ascending. Feeds the
    /// indexing pipeline.
    fn list_unindexed(
        &self,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<Conversation>, StorageError>> + Send;

    /// Record that a conversation has been embedded.
    ///
    /// Fails with [`StorageError::NotFound`] for an unknown id. Idempotent
    /// when already indexed; the original timestamp is preserved.
    fn mark_indexed(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;

    /// Aggregate counts over the store.
    fn stats(&self) -> impl std::future::Future<Output = Result<ConversationStats, StorageError>> + Send;
}
