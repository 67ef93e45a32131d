//! Text-to-vector embedding abstraction.
//!
//! `EmbeddingProvider` is the capability contract all backends implement;
//! `BoxEmbeddingProvider` erases the concrete backend for runtime
//! selection. Implementations (Ollama, OpenAI, Voyage) live in
//! `recall-infra`.

pub mod box_provider;
pub mod provider;

pub use box_provider::BoxEmbeddingProvider;
pub use provider::EmbeddingProvider;
