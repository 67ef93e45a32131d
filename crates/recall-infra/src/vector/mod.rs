//! Vector database infrastructure.
//!
//! LanceDB connection management, the Arrow schema for the documents
//! table, and the `VectorStore` implementation.

pub mod documents;
pub mod lance;
pub mod schema;

pub use documents::LanceDocumentStore;
pub use lance::LanceVectorStore;
