//! Error types shared across the Recall crates.
//!
//! One enum per concern: embedding backends, the two stores, configuration,
//! and the indexing pipeline. Components report the precise kind and never
//! retry internally; retry policy lives in the pipeline.

use thiserror::Error;

/// Errors from embedding provider backends.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Caller error (empty text, over the backend's length limit). Not
    /// retried automatically.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The backend cannot be reached (process down, network failure).
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// The backend throttled the request; callers may retry with backoff.
    #[error("rate limited (retry after {retry_after_ms:?}ms)")]
    RateLimited { retry_after_ms: Option<u64> },

    /// The backend rejected the credentials.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The backend answered, but not with a usable embedding.
    #[error("provider error: {message}")]
    Provider { message: String },

    #[error("deserialization error: {0}")]
    Deserialization(String),
}

impl EmbeddingError {
    /// Whether retrying the same call later can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EmbeddingError::Unavailable { .. } | EmbeddingError::RateLimited { .. }
        )
    }
}

/// Errors from the vector and conversation stores.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A vector's length differs from the store's configured dimension.
    /// Configuration or programming error; never silently coerced.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("entity not found")]
    NotFound,

    /// Disk or index failure. Surfaced to the caller, never swallowed.
    #[error("io error: {0}")]
    Io(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Errors in the resolved settings value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} api key required for the selected embedding provider")]
    MissingApiKey(&'static str),

    #[error("invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Per-conversation failure inside an indexing run.
///
/// The pipeline logs these and keeps going; only a store failure that
/// prevents the run from proceeding at all is surfaced to its caller.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_error_display() {
        let err = EmbeddingError::Unavailable {
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "provider unavailable: connection refused");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(
            EmbeddingError::RateLimited {
                retry_after_ms: Some(500)
            }
            .is_retryable()
        );
        assert!(
            EmbeddingError::Unavailable {
                message: "down".to_string()
            }
            .is_retryable()
        );
        assert!(!EmbeddingError::InvalidInput("empty".to_string()).is_retryable());
        assert!(!EmbeddingError::AuthenticationFailed.is_retryable());
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = StorageError::DimensionMismatch {
            expected: 768,
            actual: 3,
        };
        assert_eq!(err.to_string(), "dimension mismatch: expected 768, got 3");
    }

    #[test]
    fn test_pipeline_error_wraps_transparently() {
        let err: PipelineError = StorageError::NotFound.into();
        assert_eq!(err.to_string(), "entity not found");
        let err: PipelineError = EmbeddingError::AuthenticationFailed.into();
        assert_eq!(err.to_string(), "authentication failed");
    }
}
