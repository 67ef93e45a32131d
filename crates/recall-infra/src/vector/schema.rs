//! Arrow schema for the LanceDB documents table.
//!
//! One table (`documents`) holds every stored document. The vector column
//! width is not a constant: it is fixed per store instance to the
//! embedding provider's dimension at construction time.
//!
//! Arrow versions MUST match lancedb's transitive dependency (57.3 for
//! lancedb 0.26).

use std::sync::Arc;

use arrow_schema::{DataType, Field, Schema};

/// Schema for the documents table, parameterized by embedding dimension.
///
/// `conversation_id` and `chunk_index` are promoted out of the metadata
/// `extra` map into real columns so filter predicates can reach them;
/// the remaining `extra` entries are stored as a JSON string.
pub fn documents_schema(dimension: i32) -> Schema {
    Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("text", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, false),
        Field::new("project_path", DataType::Utf8, true),
        Field::new("conversation_id", DataType::Utf8, true),
        Field::new("chunk_index", DataType::Int32, true),
        Field::new("created_at", DataType::Utf8, false),
        Field::new("extra", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, true)),
                dimension,
            ),
            false,
        ),
    ])
}
