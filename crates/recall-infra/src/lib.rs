//! Infrastructure layer for Recall.
//!
//! Contains implementations of the capability traits defined in
//! `recall-core`: reqwest-based embedding backends (Ollama, OpenAI,
//! Voyage), the LanceDB document store, and the SQLite + JSON-file
//! conversation store.

pub mod embedding;
pub mod sqlite;
pub mod vector;
