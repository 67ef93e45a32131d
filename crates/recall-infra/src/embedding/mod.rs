//! Embedding provider backends and the configuration-driven factory.
//!
//! Each backend implements `EmbeddingProvider` from `recall-core` over its
//! HTTP API. API keys are wrapped in [`secrecy::SecretString`] and never
//! appear in Debug output or logs.

pub mod ollama;
pub mod openai;
pub mod voyage;

use secrecy::SecretString;

use recall_core::embedding::BoxEmbeddingProvider;
use recall_types::config::{EmbeddingProviderKind, RecallConfig};
use recall_types::error::ConfigError;

use self::ollama::OllamaProvider;
use self::openai::OpenAiProvider;
use self::voyage::VoyageProvider;

/// Parse a `Retry-After` header (delta-seconds form) into milliseconds.
pub(crate) fn retry_after_ms(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(|secs| secs * 1000)
}

/// Build the configured embedding backend.
///
/// Cloud backends fail with [`ConfigError::MissingApiKey`] when their key
/// is absent; the local Ollama backend needs no credentials.
pub fn create_embedding_provider(
    config: &RecallConfig,
) -> Result<BoxEmbeddingProvider, ConfigError> {
    match config.embedding_provider {
        EmbeddingProviderKind::Ollama => Ok(BoxEmbeddingProvider::new(OllamaProvider::new(
            config.ollama.model.clone(),
            config.ollama.base_url.clone(),
        ))),
        EmbeddingProviderKind::OpenAi => {
            let api_key = config
                .openai
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or(ConfigError::MissingApiKey("openai"))?;
            Ok(BoxEmbeddingProvider::new(OpenAiProvider::new(
                SecretString::from(api_key),
                config.openai.model.clone(),
            )))
        }
        EmbeddingProviderKind::Voyage => {
            let api_key = config
                .voyage
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or(ConfigError::MissingApiKey("voyage"))?;
            Ok(BoxEmbeddingProvider::new(VoyageProvider::new(
                SecretString::from(api_key),
                config.voyage.model.clone(),
            )))
        }
    }
}
