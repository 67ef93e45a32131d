//! SQLite persistence layer.
//!
//! Metadata lives in SQLite behind a split reader/writer pool; message
//! bodies live in sharded JSON files managed by the conversation store.

pub mod conversation;
pub mod pool;

pub use conversation::SqliteConversationStore;
pub use pool::DatabasePool;
