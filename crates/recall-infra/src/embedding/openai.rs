//! OpenAiProvider -- embeddings from the OpenAI API.
//!
//! Sends `POST /v1/embeddings` with Bearer auth. The batch endpoint is
//! native: one request embeds every input, and response items are
//! re-ordered by their `index` field before returning so outputs always
//! line up one-to-one with inputs.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and only exposed
//! when building the Authorization header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use recall_core::embedding::EmbeddingProvider;
use recall_types::error::EmbeddingError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Embedding provider backed by the OpenAI embeddings API.
///
/// Default model `text-embedding-3-small` produces 1536-dimensional
/// vectors.
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    dimension: usize,
}

#[derive(Serialize)]
struct OpenAiEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingItem>,
}

#[derive(Deserialize)]
struct OpenAiEmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiProvider {
    /// Vector dimension for known OpenAI embedding models.
    fn model_dimension(model: &str) -> usize {
        match model {
            "text-embedding-3-small" => 1536,
            "text-embedding-3-large" => 3072,
            "text-embedding-ada-002" => 1536,
            _ => 1536,
        }
    }

    pub fn new(api_key: SecretString, model: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to create reqwest client");

        let dimension = Self::model_dimension(&model);

        Self {
            client,
            api_key,
            base_url: "https://api.openai.com".to_string(),
            model,
            dimension,
        }
    }

    /// Override the base URL (useful for tests or proxies).
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn request_embeddings(
        &self,
        texts: &[String],
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let url = format!("{}/v1/embeddings", self.base_url);
        let body = OpenAiEmbeddingRequest {
            model: &self.model,
            input: texts,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    EmbeddingError::Unavailable {
                        message: format!("failed to reach OpenAI: {e}"),
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
                401 => EmbeddingError::AuthenticationFailed,
                429 => EmbeddingError::RateLimited { retry_after_ms },
                _ => EmbeddingError::Provider {
                    message: format!("OpenAI API error (HTTP {status}): {error_body}"),
                },
            });
        }

        let parsed: OpenAiEmbeddingResponse = response.json().await.map_err(|e| {
            EmbeddingError::Deserialization(format!("unexpected OpenAI response: {e}"))
        })?;

        if parsed.data.len() != texts.len() {
            return Err(EmbeddingError::Provider {
                message: format!(
                    "expected {} embeddings, got {}",
                    texts.len(),
                    parsed.data.len()
                ),
            });
        }

        // The API documents input order, but index is authoritative.
        let mut items = parsed.data;
        items.sort_by_key(|item| item.index);

        let mut embeddings = Vec::with_capacity(items.len());
        for item in items {
            if item.embedding.len() != self.dimension {
                return Err(EmbeddingError::Provider {
                    message: format!(
                        "model '{}' returned {} dimensions, expected {}",
                        self.model,
                        item.embedding.len(),
                        self.dimension
                    ),
                });
            }
            embeddings.push(item.embedding);
        }
        Ok(embeddings)
    }

    fn validate(texts: &[String]) -> Result<(), EmbeddingError> {
        if texts.iter().any(|t| t.trim().is_empty()) {
            return Err(EmbeddingError::InvalidInput(
                "cannot embed empty text".to_string(),
            ));
        }
        Ok(())
    }
}

impl EmbeddingProvider for OpenAiProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let texts = [text.to_string()];
        Self::validate(&texts)?;
        let mut embeddings = self.request_embeddings(&texts).await?;
        Ok(embeddings.remove(0))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        Self::validate(texts)?;
        self.request_embeddings(texts).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
