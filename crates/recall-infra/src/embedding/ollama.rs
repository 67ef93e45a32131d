//! OllamaProvider -- embeddings from a local Ollama server.
//!
//! Talks to `POST /api/embeddings` with `{model, prompt}`. Ollama has no
//! native batch endpoint, so `embed_batch` iterates. No credentials
//! needed; the usual failure mode is the server simply not running, which
//! surfaces as `EmbeddingError::Unavailable`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use recall_core::embedding::EmbeddingProvider;
use recall_types::error::EmbeddingError;

/// Request timeout for embedding calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Embedding provider backed by Ollama's local API.
///
/// Default model `nomic-embed-text` produces 768-dimensional vectors.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaProvider {
    /// Vector dimension for known Ollama embedding models.
    fn model_dimension(model: &str) -> usize {
        match model {
            "nomic-embed-text" => 768,
            "mxbai-embed-large" => 1024,
            "all-minilm" => 384,
            "snowflake-arctic-embed" => 1024,
            _ => 768,
        }
    }

    /// Create a provider for the given model and base URL
    /// (e.g., `http://localhost:11434`).
    pub fn new(model: String, base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to create reqwest client");

        let dimension = Self::model_dimension(&model);

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            dimension,
        }
    }

    async fn request_embedding(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let body = OllamaEmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    EmbeddingError::Unavailable {
                        message: format!(
                            "failed to reach Ollama at {}: {e}. Is the server running?",
                            self.base_url
                        ),
                    }
                } else {
                    EmbeddingError::Provider {
                        message: format!("HTTP request failed: {e}"),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = super::retry_after_ms(response.headers());
            let error_body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => EmbeddingError::RateLimited { retry_after_ms },
                _ => EmbeddingError::Provider {
                    message: format!("Ollama API error (HTTP {status}): {error_body}"),
                },
            });
        }

        let parsed: OllamaEmbeddingResponse = response.json().await.map_err(|e| {
            EmbeddingError::Deserialization(format!("unexpected Ollama response: {e}"))
        })?;

        if parsed.embedding.len() != self.dimension {
            return Err(EmbeddingError::Provider {
                message: format!(
                    "model '{}' returned {} dimensions, expected {}",
                    self.model,
                    parsed.embedding.len(),
                    self.dimension
                ),
            });
        }

        Ok(parsed.embedding)
    }
}

impl EmbeddingProvider for OllamaProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "cannot embed empty text".to_string(),
            ));
        }
        self.request_embedding(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
