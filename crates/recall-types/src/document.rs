//! Document and search types for the vector store.
//!
//! A `Document` is an immutable (text, metadata) pair identified by a
//! generated id; its embedding vector lives only in the vector store, keyed
//! by that id. `SearchResult` pairs a document with the similarity score
//! derived from the index's cosine distance.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Well-known `extra` key linking a document back to its conversation.
///
/// The vector store promotes this key to a real column so it can be used
/// in filter predicates, and restores it into `extra` on read.
pub const EXTRA_CONVERSATION_ID: &str = "conversation_id";

/// Well-known `extra` key recording a document's position within a
/// chunked conversation (per-message indexing granularity).
pub const EXTRA_CHUNK_INDEX: &str = "chunk_index";

/// Origin of a document or conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Captured from a Claude Code assistant session.
    ClaudeCode,
    /// Added by hand (notes, snippets).
    Manual,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::ClaudeCode => write!(f, "claude_code"),
            Source::Manual => write!(f, "manual"),
        }
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "claude_code" => Ok(Source::ClaudeCode),
            "manual" => Ok(Source::Manual),
            other => Err(format!("invalid source: '{other}'")),
        }
    }
}

/// Metadata attached to a stored document.
///
/// Used for filtering and provenance, never for ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub source: Source,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Free-form string-to-string annotations. See [`EXTRA_CONVERSATION_ID`]
    /// and [`EXTRA_CHUNK_INDEX`] for keys the store understands.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl DocumentMetadata {
    /// Metadata with the given source, created now, no annotations.
    pub fn new(source: Source) -> Self {
        Self {
            source,
            project_path: None,
            created_at: Utc::now(),
            extra: BTreeMap::new(),
        }
    }

    /// The conversation this document was derived from, if any.
    pub fn conversation_id(&self) -> Option<&str> {
        self.extra.get(EXTRA_CONVERSATION_ID).map(String::as_str)
    }
}

/// A document stored in the vector store.
///
/// Immutable once stored; replaced wholesale, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create a document with a freshly generated id.
    ///
    /// Ids are UUIDv7 strings: time-ordered, so ascending id order matches
    /// insertion order. Search uses this for deterministic tie-breaking.
    pub fn new(text: impl Into<String>, metadata: DocumentMetadata) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            text: text.into(),
            metadata,
        }
    }

    /// Create a document with a caller-chosen id.
    pub fn with_id(
        id: impl Into<String>,
        text: impl Into<String>,
        metadata: DocumentMetadata,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata,
        }
    }
}

/// A single hit from a similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub document: Document,
    /// Similarity score, higher is closer. `1.0 / (1.0 + distance)`.
    pub score: f32,
    /// Raw distance reported by the index.
    pub distance: f32,
}

/// Exact-equality metadata predicates for narrowing a search.
///
/// All set fields must match; filtering happens before the result limit
/// is applied.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub source: Option<Source>,
    pub project_path: Option<String>,
    pub conversation_id: Option<String>,
}

impl SearchFilter {
    /// Filter restricted to a single project.
    pub fn project(project_path: impl Into<String>) -> Self {
        Self {
            project_path: Some(project_path.into()),
            ..Self::default()
        }
    }

    /// Filter restricted to documents derived from one conversation.
    pub fn conversation(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            ..Self::default()
        }
    }

    /// True when no predicate is set.
    pub fn is_empty(&self) -> bool {
        self.source.is_none() && self.project_path.is_none() && self.conversation_id.is_none()
    }
}
