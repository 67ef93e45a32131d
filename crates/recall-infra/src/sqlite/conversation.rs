//! SQLite + JSON-file conversation store.
//!
//! Implements `ConversationStore` from `recall-core`. Metadata (ids,
//! timestamps, the `indexed_at` marker) lives in SQLite so listings and
//! the unindexed scan are single queries; full message bodies live in
//! sharded JSON files under the conversations directory, written
//! atomically via a temp file and rename.
//!
//! Follows the raw-query, private-Row-struct pattern with split
//! reader/writer pool usage.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sqlx::Row;

use recall_core::storage::ConversationStore;
use recall_types::conversation::{Conversation, ConversationStats};
use recall_types::document::Source;
use recall_types::error::StorageError;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `ConversationStore`.
pub struct SqliteConversationStore {
    pool: DatabasePool,
    conversations_dir: PathBuf,
}

impl SqliteConversationStore {
    /// Create a store backed by the given pool, with message files under
    /// `conversations_dir`.
    pub fn new(pool: DatabasePool, conversations_dir: impl Into<PathBuf>) -> Self {
        Self {
            pool,
            conversations_dir: conversations_dir.into(),
        }
    }

    /// Path of the JSON file for a conversation id.
    ///
    /// Files are sharded by the first two characters of the id to keep
    /// directory listings small.
    fn conversation_path(&self, id: &str) -> PathBuf {
        let shard: String = id.chars().take(2).collect();
        self.conversations_dir.join(shard).join(format!("{id}.json"))
    }

    async fn write_conversation_file(
        &self,
        conversation: &Conversation,
    ) -> Result<(), StorageError> {
        let path = self.conversation_path(&conversation.id);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let json = serde_json::to_vec_pretty(conversation)?;

        // Write-then-rename so readers never see a partial file.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, &path).await?;

        Ok(())
    }

    async fn read_messages(&self, id: &str) -> Result<Vec<recall_types::conversation::Message>, StorageError> {
        let path = self.conversation_path(id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let stored: Conversation = serde_json::from_slice(&bytes)?;
                Ok(stored.messages)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_conversation_file(&self, id: &str) -> Result<(), StorageError> {
        let path = self.conversation_path(id);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_rows(&self, rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<Conversation>, StorageError> {
        let mut conversations = Vec::with_capacity(rows.len());
        for row in &rows {
            let conversation_row =
                ConversationRow::from_row(row).map_err(|e| StorageError::Query(e.to_string()))?;
            let mut conversation = conversation_row.into_conversation()?;
            conversation.messages = self.read_messages(&conversation.id).await?;
            conversations.push(conversation);
        }
        Ok(conversations)
    }

    /// Directory holding the sharded JSON files.
    pub fn conversations_dir(&self) -> &Path {
        &self.conversations_dir
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct ConversationRow {
    id: String,
    source: String,
    project_path: Option<String>,
    title: Option<String>,
    created_at: String,
    updated_at: String,
    indexed_at: Option<String>,
}

impl ConversationRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            source: row.try_get("source")?,
            project_path: row.try_get("project_path")?,
            title: row.try_get("title")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            indexed_at: row.try_get("indexed_at")?,
        })
    }

    /// Convert to a domain conversation with an empty message list; the
    /// caller fills messages in from the JSON file.
    fn into_conversation(self) -> Result<Conversation, StorageError> {
        let source: Source = self
            .source
            .parse()
            .map_err(|e: String| StorageError::Query(e))?;
        let created_at = parse_datetime(&self.created_at)?;
        let updated_at = parse_datetime(&self.updated_at)?;
        let indexed_at = self.indexed_at.as_deref().map(parse_datetime).transpose()?;

        Ok(Conversation {
            id: self.id,
            source,
            project_path: self.project_path,
            title: self.title,
            created_at,
            updated_at,
            messages: Vec::new(),
            indexed_at,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

// ---------------------------------------------------------------------------
// ConversationStore implementation
// ---------------------------------------------------------------------------

impl ConversationStore for SqliteConversationStore {
    async fn save(&self, conversation: &Conversation) -> Result<(), StorageError> {
        // The file carries the full thread; the row mirrors the metadata.
        self.write_conversation_file(conversation).await?;

        sqlx::query(
            r#"INSERT INTO conversations (id, source, project_path, title, created_at, updated_at, indexed_at, message_count)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   source = excluded.source,
                   project_path = excluded.project_path,
                   title = excluded.title,
                   created_at = excluded.created_at,
                   updated_at = excluded.updated_at,
                   indexed_at = excluded.indexed_at,
                   message_count = excluded.message_count"#,
        )
        .bind(&conversation.id)
        .bind(conversation.source.to_string())
        .bind(&conversation.project_path)
        .bind(&conversation.title)
        .bind(format_datetime(&conversation.created_at))
        .bind(format_datetime(&conversation.updated_at))
        .bind(conversation.indexed_at.as_ref().map(format_datetime))
        .bind(conversation.messages.len() as i64)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Conversation>, StorageError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let conversation_row =
            ConversationRow::from_row(&row).map_err(|e| StorageError::Query(e.to_string()))?;
        let mut conversation = conversation_row.into_conversation()?;
        conversation.messages = self.read_messages(id).await?;

        Ok(Some(conversation))
    }

    async fn delete(&self, id: &str) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = ?")
            .bind(id)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        self.remove_conversation_file(id).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_all(&self, limit: usize, offset: usize) -> Result<Vec<Conversation>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM conversations ORDER BY updated_at DESC LIMIT ? OFFSET ?",
        )
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        self.load_rows(rows).await
    }

    async fn list_by_project(&self, project_path: &str) -> Result<Vec<Conversation>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM conversations WHERE project_path = ? ORDER BY created_at ASC",
        )
        .bind(project_path)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        self.load_rows(rows).await
    }

    async fn list_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        source: Option<Source>,
        limit: usize,
    ) -> Result<Vec<Conversation>, StorageError> {
        // Timestamps are stored as RFC 3339 UTC strings, so string
        // comparison matches chronological order.
        let mut sql = String::from(
            "SELECT * FROM conversations WHERE created_at >= ? AND created_at <= ?",
        );
        if source.is_some() {
            sql.push_str(" AND source = ?");
        }
        sql.push_str(" ORDER BY created_at DESC LIMIT ?");

        let mut query = sqlx::query(&sql)
            .bind(format_datetime(&start))
            .bind(format_datetime(&end));
        if let Some(source) = source {
            query = query.bind(source.to_string());
        }

        let rows = query
            .bind(limit as i64)
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| StorageError::Query(e.to_string()))?;

        self.load_rows(rows).await
    }

    async fn list_unindexed(&self, limit: usize) -> Result<Vec<Conversation>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM conversations WHERE indexed_at IS NULL ORDER BY created_at ASC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        self.load_rows(rows).await
    }

    async fn mark_indexed(&self, id: &str) -> Result<(), StorageError> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE conversations SET indexed_at = ? WHERE id = ? AND indexed_at IS NULL",
        )
        .bind(format_datetime(&now))
        .bind(id)
        .execute(&self.pool.writer)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            // Either unknown or already indexed. Already-indexed is a
            // no-op that keeps the original timestamp.
            let exists: Option<(i64,)> =
                sqlx::query_as("SELECT 1 FROM conversations WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&self.pool.reader)
                    .await
                    .map_err(|e| StorageError::Query(e.to_string()))?;
            return if exists.is_some() {
                Ok(())
            } else {
                Err(StorageError::NotFound)
            };
        }

        // Keep the JSON file in sync so it stays a self-contained record.
        // A missing file is fine; any other read failure must surface.
        let path = self.conversation_path(id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let mut stored: Conversation = serde_json::from_slice(&bytes)?;
                stored.indexed_at = Some(now);
                self.write_conversation_file(&stored).await?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }

    async fn stats(&self) -> Result<ConversationStats, StorageError> {
        let row: (i64, i64, i64) = sqlx::query_as(
            r#"SELECT COUNT(*),
                      COUNT(indexed_at),
                      COUNT(DISTINCT project_path)
               FROM conversations"#,
        )
        .fetch_one(&self.pool.reader)
        .await
        .map_err(|e| StorageError::Query(e.to_string()))?;

        Ok(ConversationStats {
            total: row.0 as u64,
            indexed: row.1 as u64,
            projects: row.2 as u64,
        })
    }
}
