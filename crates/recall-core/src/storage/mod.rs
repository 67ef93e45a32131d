//! Store traits implemented by the infrastructure layer.

pub mod conversation;
pub mod vector;

pub use conversation::ConversationStore;
pub use vector::VectorStore;
