//! End-to-end indexing flow over the real stores.
//!
//! Drives the indexing pipeline with a deterministic stub embedder, a
//! LanceDB document store, and the SQLite + JSON conversation store, all
//! in temp directories.

use tempfile::TempDir;

use recall_core::embedding::EmbeddingProvider;
use recall_core::index::{IndexGranularity, IndexingPipeline};
use recall_core::storage::{ConversationStore, VectorStore};
use recall_infra::sqlite::{DatabasePool, SqliteConversationStore};
use recall_infra::vector::LanceDocumentStore;
use recall_types::conversation::{Conversation, Message, MessageRole};
use recall_types::document::{EXTRA_CONVERSATION_ID, SearchFilter, Source};
use recall_types::error::EmbeddingError;

const DIM: usize = 8;

/// Deterministic embedder: folds bytes into a fixed-width vector so the
/// same text always lands at the same point.
struct StubProvider;

impl StubProvider {
    fn vector_for(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; DIM];
        for (i, byte) in text.bytes().enumerate() {
            vector[i % DIM] += byte as f32 / 255.0;
        }
        vector
    }
}

impl EmbeddingProvider for StubProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(Self::vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }

    fn model_name(&self) -> &str {
        "stub"
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

async fn stores(dir: &TempDir) -> (LanceDocumentStore, SqliteConversationStore) {
    let db_path = dir.path().join("conversations.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = DatabasePool::new(&url).await.unwrap();
    let conversations = SqliteConversationStore::new(pool, dir.path().join("conversations"));

    let vectors = LanceDocumentStore::new(dir.path().join("vector_store"), DIM)
        .await
        .unwrap();

    (vectors, conversations)
}

fn conversation(id: &str, project: &str, exchanges: &[(&str, &str)]) -> Conversation {
    let mut messages = Vec::new();
    for (question, answer) in exchanges {
        messages.push(Message::new(MessageRole::User, *question));
        messages.push(Message::new(MessageRole::Assistant, *answer));
    }
    let mut conv = Conversation::new(Source::ClaudeCode, Some(project.to_string()), messages);
    conv.id = id.to_string();
    conv
}

#[tokio::test]
async fn indexes_saved_conversations_and_makes_them_searchable() {
    let dir = tempfile::tempdir().unwrap();
    let (vectors, conversations) = stores(&dir).await;

    conversations
        .save(&conversation("c1", "/home/me/api", &[("fix bug", "try X")]))
        .await
        .unwrap();
    conversations
        .save(&conversation(
            "c2",
            "/home/me/web",
            &[("style the navbar", "use flexbox")],
        ))
        .await
        .unwrap();

    let pipeline = IndexingPipeline::new(StubProvider, vectors, conversations);
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.scanned, 2);
    assert_eq!(report.indexed, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.documents_written, 2);

    // Fresh handles on the same directories.
    let (vectors, conversations) = stores(&dir).await;

    assert!(conversations.list_unindexed(10).await.unwrap().is_empty());
    let stats = conversations.stats().await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.indexed, 2);

    let query = StubProvider::vector_for("user: fix bug\nassistant: try X");
    let results = vectors.search(&query, 1, None).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].document.metadata.extra.get(EXTRA_CONVERSATION_ID),
        Some(&"c1".to_string())
    );
    assert!(results[0].document.text.contains("fix bug"));
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let (vectors, conversations) = stores(&dir).await;

    conversations
        .save(&conversation("c1", "/p", &[("hello", "hi")]))
        .await
        .unwrap();

    let pipeline = IndexingPipeline::new(StubProvider, vectors, conversations);
    pipeline.run().await.unwrap();

    let report = pipeline.run().await.unwrap();
    assert_eq!(report.scanned, 0);
    assert_eq!(report.indexed, 0);
    assert_eq!(report.documents_written, 0);

    let (vectors, _) = stores(&dir).await;
    assert_eq!(vectors.count().await.unwrap(), 1);
}

#[tokio::test]
async fn per_message_granularity_filters_by_conversation() {
    let dir = tempfile::tempdir().unwrap();
    let (vectors, conversations) = stores(&dir).await;

    conversations
        .save(&conversation(
            "c1",
            "/p",
            &[("first question", "first answer"), ("second question", "second answer")],
        ))
        .await
        .unwrap();
    conversations
        .save(&conversation("c2", "/p", &[("unrelated", "noise")]))
        .await
        .unwrap();

    let pipeline = IndexingPipeline::new(StubProvider, vectors, conversations)
        .with_granularity(IndexGranularity::PerMessage);
    let report = pipeline.run().await.unwrap();
    assert_eq!(report.documents_written, 6);

    let (vectors, _) = stores(&dir).await;
    let filter = SearchFilter::conversation("c1");
    let query = StubProvider::vector_for("user: first question");
    let results = vectors.search(&query, 10, Some(&filter)).await.unwrap();

    assert_eq!(results.len(), 4);
    assert!(
        results
            .iter()
            .all(|r| r.document.metadata.conversation_id() == Some("c1"))
    );
}
