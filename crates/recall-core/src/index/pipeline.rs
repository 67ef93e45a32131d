//! The indexing pipeline.
//!
//! Pulls unindexed conversations from the conversation store, renders
//! their messages into embeddable text, embeds through the provider,
//! writes documents into the vector store, and flips the indexed flag.
//!
//! Per-conversation failures are isolated: the conversation stays
//! unindexed and is retried on the next run (at-least-once). Only a
//! conversation-store failure that prevents the run from starting at all
//! is surfaced to the caller. The flag is set strictly after the vector
//! writes succeed, so a crash or cancellation between the two leaves the
//! conversation queued, never lost.

use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use recall_types::conversation::Conversation;
use recall_types::document::{
    Document, DocumentMetadata, EXTRA_CHUNK_INDEX, EXTRA_CONVERSATION_ID,
};
use recall_types::error::{PipelineError, StorageError};

use crate::embedding::EmbeddingProvider;
use crate::storage::{ConversationStore, VectorStore};

/// How conversations are sliced into documents.
///
/// The choice is a deployment policy: per-conversation search returns
/// whole threads, per-message returns individual turns. One value is
/// configured per store and must stay consistent across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexGranularity {
    /// One document per conversation, messages concatenated.
    #[default]
    PerConversation,
    /// One document per message, `chunk_index` recording position.
    PerMessage,
}

/// Outcome of a single pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Unindexed conversations fetched for this run.
    pub scanned: usize,
    /// Conversations embedded and marked indexed.
    pub indexed: usize,
    /// Conversations with nothing to embed, marked indexed without writes.
    pub skipped: usize,
    /// Conversations left unindexed for the next run.
    pub failed: usize,
    /// Documents written to the vector store.
    pub documents_written: usize,
}

/// Orchestrates one incremental indexing pass.
///
/// Generic over the three capability traits; see [`IndexingPipeline::run`].
pub struct IndexingPipeline<P, V, C> {
    provider: P,
    vectors: V,
    conversations: C,
    granularity: IndexGranularity,
    batch_limit: usize,
    max_retries: u32,
    retry_backoff: Duration,
    cancel: Option<CancellationToken>,
}

impl<P, V, C> IndexingPipeline<P, V, C>
where
    P: EmbeddingProvider,
    V: VectorStore,
    C: ConversationStore,
{
    /// Default cap on conversations handled per run.
    pub const DEFAULT_BATCH_LIMIT: usize = 100;

    pub fn new(provider: P, vectors: V, conversations: C) -> Self {
        Self {
            provider,
            vectors,
            conversations,
            granularity: IndexGranularity::default(),
            batch_limit: Self::DEFAULT_BATCH_LIMIT,
            max_retries: 2,
            retry_backoff: Duration::from_millis(250),
            cancel: None,
        }
    }

    pub fn with_granularity(mut self, granularity: IndexGranularity) -> Self {
        self.granularity = granularity;
        self
    }

    pub fn with_batch_limit(mut self, limit: usize) -> Self {
        self.batch_limit = limit;
        self
    }

    /// Retries per conversation for transient provider errors.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Base delay for exponential backoff between retries.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Token checked between conversations; cancelling stops the run
    /// early, leaving the remainder unindexed.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Run one incremental indexing pass.
    ///
    /// Conversations are processed in `created_at` order. Returns an error
    /// only when the unindexed batch cannot be fetched; everything after
    /// that is per-item and reported in the [`IndexReport`].
    pub async fn run(&self) -> Result<IndexReport, StorageError> {
        let pending = self.conversations.list_unindexed(self.batch_limit).await?;

        let mut report = IndexReport {
            scanned: pending.len(),
            ..IndexReport::default()
        };

        for conversation in &pending {
            if let Some(token) = &self.cancel {
                if token.is_cancelled() {
                    info!(
                        remaining = pending.len() - report.indexed - report.skipped - report.failed,
                        "indexing run cancelled"
                    );
                    break;
                }
            }

            if conversation.messages.is_empty() {
                // Nothing to embed; mark it so it leaves the queue.
                match self.conversations.mark_indexed(&conversation.id).await {
                    Ok(()) => {
                        debug!(conversation_id = %conversation.id, "skipped empty conversation");
                        report.skipped += 1;
                    }
                    Err(err) => {
                        warn!(conversation_id = %conversation.id, error = %err, "failed to mark empty conversation");
                        report.failed += 1;
                    }
                }
                continue;
            }

            match self.index_conversation(conversation).await {
                Ok(written) => {
                    report.indexed += 1;
                    report.documents_written += written;
                }
                Err(err) => {
                    warn!(
                        conversation_id = %conversation.id,
                        error = %err,
                        "failed to index conversation, will retry next run"
                    );
                    report.failed += 1;
                }
            }
        }

        info!(
            scanned = report.scanned,
            indexed = report.indexed,
            skipped = report.skipped,
            failed = report.failed,
            documents = report.documents_written,
            "indexing run complete"
        );

        Ok(report)
    }

    /// Embed one conversation and mark it indexed. Returns the number of
    /// documents written.
    async fn index_conversation(&self, conversation: &Conversation) -> Result<usize, PipelineError> {
        let documents = build_documents(conversation, self.granularity);
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();

        let embeddings = self.embed_with_retry(&texts).await?;

        // Clear any documents a previously interrupted run may have
        // written, so at-least-once delivery cannot duplicate them.
        self.vectors
            .delete_by_conversation(&conversation.id)
            .await?;
        self.vectors.add_batch(&documents, &embeddings).await?;

        self.conversations.mark_indexed(&conversation.id).await?;

        debug!(
            conversation_id = %conversation.id,
            documents = documents.len(),
            "conversation indexed"
        );
        Ok(documents.len())
    }

    /// Batch-embed with bounded retry on transient provider errors.
    async fn embed_with_retry(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, PipelineError> {
        let mut attempt: u32 = 0;
        loop {
            match self.provider.embed_batch(texts).await {
                Ok(embeddings) => return Ok(embeddings),
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    let hinted = match &err {
                        recall_types::error::EmbeddingError::RateLimited {
                            retry_after_ms: Some(ms),
                        } => Some(Duration::from_millis(*ms)),
                        _ => None,
                    };
                    let delay = hinted.unwrap_or(self.retry_backoff * 2u32.pow(attempt));
                    debug!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "retrying embed");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Render a conversation's messages into one embeddable text block.
pub fn render_conversation(conversation: &Conversation) -> String {
    conversation
        .messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the documents a conversation contributes, per the granularity
/// policy. Every document carries `extra["conversation_id"]` so search
/// results link back to their thread.
fn build_documents(conversation: &Conversation, granularity: IndexGranularity) -> Vec<Document> {
    let base_metadata = |chunk_index: Option<usize>| {
        let mut metadata = DocumentMetadata {
            source: conversation.source,
            project_path: conversation.project_path.clone(),
            created_at: Utc::now(),
            extra: Default::default(),
        };
        metadata
            .extra
            .insert(EXTRA_CONVERSATION_ID.to_string(), conversation.id.clone());
        if let Some(index) = chunk_index {
            metadata
                .extra
                .insert(EXTRA_CHUNK_INDEX.to_string(), index.to_string());
        }
        metadata
    };

    match granularity {
        IndexGranularity::PerConversation => {
            vec![Document::new(
                render_conversation(conversation),
                base_metadata(None),
            )]
        }
        IndexGranularity::PerMessage => conversation
            .messages
            .iter()
            .enumerate()
            .map(|(index, message)| {
                Document::new(
                    format!("{}: {}", message.role, message.content),
                    base_metadata(Some(index)),
                )
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use recall_types::conversation::{ConversationStats, Message, MessageRole};
    use recall_types::document::{SearchFilter, SearchResult, Source};
    use recall_types::error::EmbeddingError;

    use super::*;

    // -- in-memory fakes -------------------------------------------------

    /// Deterministic embedder: folds bytes into a small fixed vector.
    /// Fails with a transient error for texts containing `fail_on`, the
    /// first `flaky_failures` calls failing with RateLimited when set.
    struct StubProvider {
        dimension: usize,
        fail_on: Option<&'static str>,
        flaky_failures: AtomicUsize,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn new(dimension: usize) -> Self {
            Self {
                dimension,
                fail_on: None,
                flaky_failures: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing_on(mut self, needle: &'static str) -> Self {
            self.fail_on = Some(needle);
            self
        }

        fn flaky(self, failures: usize) -> Self {
            self.flaky_failures.store(failures, Ordering::SeqCst);
            self
        }

        fn vector_for(&self, text: &str) -> Vec<f32> {
            let mut vector = vec![0.0f32; self.dimension];
            for (i, byte) in text.bytes().enumerate() {
                vector[i % self.dimension] += byte as f32 / 255.0;
            }
            vector
        }
    }

    impl EmbeddingProvider for StubProvider {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.flaky_failures.load(Ordering::SeqCst) > 0 {
                self.flaky_failures.fetch_sub(1, Ordering::SeqCst);
                return Err(EmbeddingError::RateLimited {
                    retry_after_ms: Some(1),
                });
            }
            if let Some(needle) = self.fail_on {
                if text.contains(needle) {
                    return Err(EmbeddingError::Unavailable {
                        message: "backend down".to_string(),
                    });
                }
            }
            Ok(self.vector_for(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }

        fn model_name(&self) -> &str {
            "stub"
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }

    #[derive(Default)]
    struct MemoryVectorStore {
        dimension: usize,
        rows: Mutex<Vec<(Document, Vec<f32>)>>,
    }

    impl MemoryVectorStore {
        fn new(dimension: usize) -> Self {
            Self {
                dimension,
                rows: Mutex::new(Vec::new()),
            }
        }
    }

    impl VectorStore for MemoryVectorStore {
        async fn add(&self, document: &Document, embedding: &[f32]) -> Result<String, StorageError> {
            if embedding.len() != self.dimension {
                return Err(StorageError::DimensionMismatch {
                    expected: self.dimension,
                    actual: embedding.len(),
                });
            }
            let mut rows = self.rows.lock().unwrap();
            rows.retain(|(d, _)| d.id != document.id);
            rows.push((document.clone(), embedding.to_vec()));
            Ok(document.id.clone())
        }

        async fn add_batch(
            &self,
            documents: &[Document],
            embeddings: &[Vec<f32>],
        ) -> Result<(), StorageError> {
            for (document, embedding) in documents.iter().zip(embeddings) {
                self.add(document, embedding).await?;
            }
            Ok(())
        }

        async fn search(
            &self,
            query: &[f32],
            limit: usize,
            _filter: Option<&SearchFilter>,
        ) -> Result<Vec<SearchResult>, StorageError> {
            if query.len() != self.dimension {
                return Err(StorageError::DimensionMismatch {
                    expected: self.dimension,
                    actual: query.len(),
                });
            }
            let rows = self.rows.lock().unwrap();
            let mut results: Vec<SearchResult> = rows
                .iter()
                .map(|(document, embedding)| {
                    let distance: f32 = query
                        .iter()
                        .zip(embedding)
                        .map(|(a, b)| (a - b).powi(2))
                        .sum();
                    SearchResult {
                        document: document.clone(),
                        score: 1.0 / (1.0 + distance),
                        distance,
                    }
                })
                .collect();
            results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
            results.truncate(limit);
            Ok(results)
        }

        async fn get(&self, id: &str) -> Result<Option<Document>, StorageError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows.iter().find(|(d, _)| d.id == id).map(|(d, _)| d.clone()))
        }

        async fn delete(&self, id: &str) -> Result<(), StorageError> {
            self.rows.lock().unwrap().retain(|(d, _)| d.id != id);
            Ok(())
        }

        async fn delete_by_conversation(
            &self,
            conversation_id: &str,
        ) -> Result<u64, StorageError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|(d, _)| d.metadata.conversation_id() != Some(conversation_id));
            Ok((before - rows.len()) as u64)
        }

        async fn count(&self) -> Result<u64, StorageError> {
            Ok(self.rows.lock().unwrap().len() as u64)
        }

        fn dimension(&self) -> usize {
            self.dimension
        }
    }

    #[derive(Default)]
    struct MemoryConversationStore {
        rows: Mutex<BTreeMap<String, Conversation>>,
    }

    impl ConversationStore for MemoryConversationStore {
        async fn save(&self, conversation: &Conversation) -> Result<(), StorageError> {
            self.rows
                .lock()
                .unwrap()
                .insert(conversation.id.clone(), conversation.clone());
            Ok(())
        }

        async fn get(&self, id: &str) -> Result<Option<Conversation>, StorageError> {
            Ok(self.rows.lock().unwrap().get(id).cloned())
        }

        async fn delete(&self, id: &str) -> Result<bool, StorageError> {
            Ok(self.rows.lock().unwrap().remove(id).is_some())
        }

        async fn list_all(
            &self,
            limit: usize,
            offset: usize,
        ) -> Result<Vec<Conversation>, StorageError> {
            let mut out: Vec<Conversation> = self.rows.lock().unwrap().values().cloned().collect();
            out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
            Ok(out.into_iter().skip(offset).take(limit).collect())
        }

        async fn list_by_project(
            &self,
            project_path: &str,
        ) -> Result<Vec<Conversation>, StorageError> {
            let mut out: Vec<Conversation> = self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|c| c.project_path.as_deref() == Some(project_path))
                .cloned()
                .collect();
            out.sort_by_key(|c| c.created_at);
            Ok(out)
        }

        async fn list_by_date_range(
            &self,
            start: chrono::DateTime<Utc>,
            end: chrono::DateTime<Utc>,
            source: Option<Source>,
            limit: usize,
        ) -> Result<Vec<Conversation>, StorageError> {
            let mut out: Vec<Conversation> = self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|c| c.created_at >= start && c.created_at <= end)
                .filter(|c| source.is_none_or(|s| c.source == s))
                .cloned()
                .collect();
            out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            out.truncate(limit);
            Ok(out)
        }

        async fn list_unindexed(&self, limit: usize) -> Result<Vec<Conversation>, StorageError> {
            let mut out: Vec<Conversation> = self
                .rows
                .lock()
                .unwrap()
                .values()
                .filter(|c| !c.is_indexed())
                .cloned()
                .collect();
            out.sort_by_key(|c| c.created_at);
            out.truncate(limit);
            Ok(out)
        }

        async fn mark_indexed(&self, id: &str) -> Result<(), StorageError> {
            let mut rows = self.rows.lock().unwrap();
            let conversation = rows.get_mut(id).ok_or(StorageError::NotFound)?;
            if conversation.indexed_at.is_none() {
                conversation.indexed_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn stats(&self) -> Result<ConversationStats, StorageError> {
            let rows = self.rows.lock().unwrap();
            Ok(ConversationStats {
                total: rows.len() as u64,
                indexed: rows.values().filter(|c| c.is_indexed()).count() as u64,
                projects: rows
                    .values()
                    .filter_map(|c| c.project_path.as_deref())
                    .collect::<std::collections::BTreeSet<_>>()
                    .len() as u64,
            })
        }
    }

    fn conversation(id: &str, content: &str) -> Conversation {
        let mut conv = Conversation::new(
            Source::ClaudeCode,
            Some("/home/me/project".to_string()),
            vec![
                Message::new(MessageRole::User, content),
                Message::new(MessageRole::Assistant, "try X"),
            ],
        );
        conv.id = id.to_string();
        conv
    }

    // -- tests -----------------------------------------------------------

    #[tokio::test]
    async fn test_run_indexes_all_pending() {
        let conversations = MemoryConversationStore::default();
        conversations.save(&conversation("c1", "fix bug")).await.unwrap();
        conversations.save(&conversation("c2", "add tests")).await.unwrap();

        let pipeline = IndexingPipeline::new(
            StubProvider::new(8),
            MemoryVectorStore::new(8),
            conversations,
        );

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.indexed, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.documents_written, 2);

        assert!(pipeline.conversations.list_unindexed(10).await.unwrap().is_empty());
        assert_eq!(pipeline.vectors.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_documents_link_back_to_conversation() {
        let conversations = MemoryConversationStore::default();
        conversations.save(&conversation("c1", "fix bug")).await.unwrap();

        let pipeline = IndexingPipeline::new(
            StubProvider::new(8),
            MemoryVectorStore::new(8),
            conversations,
        );
        pipeline.run().await.unwrap();

        let query = StubProvider::new(8).vector_for("user: fix bug\nassistant: try X");
        let results = pipeline.vectors.search(&query, 1, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(
            results[0].document.metadata.extra.get(EXTRA_CONVERSATION_ID),
            Some(&"c1".to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_conversation_stays_queued_and_rest_proceed() {
        let conversations = MemoryConversationStore::default();
        conversations.save(&conversation("c1", "boom bug")).await.unwrap();
        conversations.save(&conversation("c2", "fine bug")).await.unwrap();

        let pipeline = IndexingPipeline::new(
            StubProvider::new(8).failing_on("boom"),
            MemoryVectorStore::new(8),
            conversations,
        )
        .with_max_retries(0);

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.indexed, 1);
        assert_eq!(report.failed, 1);

        let pending = pipeline.conversations.list_unindexed(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "c1");
        // No partial writes for the failed conversation.
        assert_eq!(pipeline.vectors.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_empty_conversation_is_skipped_not_retried() {
        let conversations = MemoryConversationStore::default();
        let mut empty = conversation("c1", "ignored");
        empty.messages.clear();
        conversations.save(&empty).await.unwrap();

        let pipeline = IndexingPipeline::new(
            StubProvider::new(8),
            MemoryVectorStore::new(8),
            conversations,
        );

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.documents_written, 0);
        assert!(pipeline.conversations.list_unindexed(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_per_message_granularity_writes_chunks() {
        let conversations = MemoryConversationStore::default();
        conversations.save(&conversation("c1", "fix bug")).await.unwrap();

        let pipeline = IndexingPipeline::new(
            StubProvider::new(8),
            MemoryVectorStore::new(8),
            conversations,
        )
        .with_granularity(IndexGranularity::PerMessage);

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.documents_written, 2);

        let query = StubProvider::new(8).vector_for("user: fix bug");
        let results = pipeline.vectors.search(&query, 2, None).await.unwrap();
        let chunks: Vec<_> = results
            .iter()
            .filter_map(|r| r.document.metadata.extra.get(EXTRA_CHUNK_INDEX))
            .collect();
        assert_eq!(chunks.len(), 2);
    }

    #[tokio::test]
    async fn test_transient_rate_limit_is_retried() {
        let conversations = MemoryConversationStore::default();
        conversations.save(&conversation("c1", "fix bug")).await.unwrap();

        let pipeline = IndexingPipeline::new(
            StubProvider::new(8).flaky(1),
            MemoryVectorStore::new(8),
            conversations,
        )
        .with_retry_backoff(Duration::from_millis(1));

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.indexed, 1);
        assert_eq!(report.failed, 0);
        assert!(pipeline.provider.calls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_rerun_after_partial_failure_does_not_duplicate() {
        let conversations = MemoryConversationStore::default();
        conversations.save(&conversation("c1", "fix bug")).await.unwrap();

        let vectors = MemoryVectorStore::new(8);
        // Simulate an earlier run that wrote the document but crashed
        // before mark_indexed.
        {
            let conv = conversations.get("c1").await.unwrap().unwrap();
            let docs = build_documents(&conv, IndexGranularity::PerConversation);
            let provider = StubProvider::new(8);
            let vecs = provider.embed_batch(&docs.iter().map(|d| d.text.clone()).collect::<Vec<_>>()).await.unwrap();
            vectors.add_batch(&docs, &vecs).await.unwrap();
        }
        assert_eq!(vectors.count().await.unwrap(), 1);

        let pipeline = IndexingPipeline::new(StubProvider::new(8), vectors, conversations);
        let report = pipeline.run().await.unwrap();
        assert_eq!(report.indexed, 1);
        // The stale document was replaced, not duplicated.
        assert_eq!(pipeline.vectors.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_stops_between_conversations() {
        let conversations = MemoryConversationStore::default();
        conversations.save(&conversation("c1", "fix bug")).await.unwrap();
        conversations.save(&conversation("c2", "add tests")).await.unwrap();

        let token = CancellationToken::new();
        token.cancel();

        let pipeline = IndexingPipeline::new(
            StubProvider::new(8),
            MemoryVectorStore::new(8),
            conversations,
        )
        .with_cancellation(token);

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.indexed, 0);
        assert_eq!(pipeline.conversations.list_unindexed(10).await.unwrap().len(), 2);
    }

    #[test]
    fn test_render_conversation_layout() {
        let conv = conversation("c1", "fix bug");
        assert_eq!(render_conversation(&conv), "user: fix bug\nassistant: try X");
    }

    #[tokio::test]
    async fn test_mark_indexed_is_idempotent() {
        let conversations = MemoryConversationStore::default();
        conversations.save(&conversation("c1", "fix bug")).await.unwrap();

        conversations.mark_indexed("c1").await.unwrap();
        let first = conversations.get("c1").await.unwrap().unwrap().indexed_at;
        conversations.mark_indexed("c1").await.unwrap();
        let second = conversations.get("c1").await.unwrap().unwrap().indexed_at;

        assert!(first.is_some());
        assert_eq!(first, second);
        assert!(matches!(
            conversations.mark_indexed("missing").await,
            Err(StorageError::NotFound)
        ));
    }
}
