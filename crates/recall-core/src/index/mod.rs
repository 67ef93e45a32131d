//! Incremental indexing: the glue between the conversation store, the
//! embedding provider, and the vector store.

pub mod pipeline;

pub use pipeline::{IndexGranularity, IndexReport, IndexingPipeline};
