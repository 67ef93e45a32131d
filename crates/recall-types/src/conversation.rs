//! Conversation and message types.
//!
//! A `Conversation` is a role-tagged message thread captured from an
//! assistant session. It is owned by the conversation store and mutated
//! only through explicit `save` / `mark_indexed` operations; message order
//! is meaningful and preserved.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::Source;

/// Role of a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            "system" => Ok(MessageRole::System),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A single message in a conversation. Immutable, ordered within its thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A captured conversation thread.
///
/// `indexed_at` records when the indexing pipeline embedded this
/// conversation; `None` means not yet indexed. The transition is monotonic:
/// it is set exactly once by `mark_indexed` after a successful vector-store
/// write, and never cleared except by an out-of-band re-index request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Create an unindexed conversation with a freshly generated id.
    pub fn new(source: Source, project_path: Option<String>, messages: Vec<Message>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(),
            source,
            project_path,
            title: None,
            created_at: now,
            updated_at: now,
            messages,
            indexed_at: None,
        }
    }

    /// Whether this conversation has been embedded into the vector store.
    pub fn is_indexed(&self) -> bool {
        self.indexed_at.is_some()
    }
}

/// Aggregate counts over the conversation store.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ConversationStats {
    pub total: u64,
    pub indexed: u64,
    pub projects: u64,
}
