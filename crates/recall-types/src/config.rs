//! Resolved configuration for the Recall core.
//!
//! The core never reads files or the environment itself; an out-of-scope
//! collaborator loads and merges settings and hands the core this value.
//! All fields have defaults so an empty TOML table deserializes to a
//! working local (Ollama) setup.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which embedding backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Local Ollama server.
    Ollama,
    /// OpenAI embeddings API.
    OpenAi,
    /// Voyage AI embeddings API.
    Voyage,
}

impl fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingProviderKind::Ollama => write!(f, "ollama"),
            EmbeddingProviderKind::OpenAi => write!(f, "openai"),
            EmbeddingProviderKind::Voyage => write!(f, "voyage"),
        }
    }
}

impl FromStr for EmbeddingProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(EmbeddingProviderKind::Ollama),
            "openai" => Ok(EmbeddingProviderKind::OpenAi),
            "voyage" => Ok(EmbeddingProviderKind::Voyage),
            other => Err(format!("invalid embedding provider: '{other}'")),
        }
    }
}

/// Settings for the local Ollama backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_model")]
    pub model: String,
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
}

fn default_ollama_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            model: default_ollama_model(),
            base_url: default_ollama_base_url(),
        }
    }
}

/// Settings for the OpenAI backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key. Required when OpenAI is the selected provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub model: String,
}

fn default_openai_model() -> String {
    "text-embedding-3-small".to_string()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
        }
    }
}

/// Settings for the Voyage AI backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoyageConfig {
    /// API key. Required when Voyage is the selected provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_voyage_model")]
    pub model: String,
}

fn default_voyage_model() -> String {
    "voyage-3".to_string()
}

impl Default for VoyageConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_voyage_model(),
        }
    }
}

/// Top-level resolved settings for Recall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecallConfig {
    #[serde(default = "default_provider")]
    pub embedding_provider: EmbeddingProviderKind,

    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub voyage: VoyageConfig,

    /// Root directory for all on-disk state.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_provider() -> EmbeddingProviderKind {
    EmbeddingProviderKind::Ollama
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".recall")
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            embedding_provider: default_provider(),
            ollama: OllamaConfig::default(),
            openai: OpenAiConfig::default(),
            voyage: VoyageConfig::default(),
            data_dir: default_data_dir(),
        }
    }
}

impl RecallConfig {
    /// Directory holding the LanceDB vector tables.
    pub fn vector_store_dir(&self) -> PathBuf {
        self.data_dir.join("vector_store")
    }

    /// Directory holding full conversation JSON files.
    pub fn conversations_dir(&self) -> PathBuf {
        self.data_dir.join("conversations")
    }

    /// sqlx URL for the conversation metadata database.
    pub fn database_url(&self) -> String {
        format!(
            "sqlite://{}?mode=rwc",
            self.data_dir.join("conversations.db").display()
        )
    }

    /// Check that the selected provider has everything it needs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.embedding_provider {
            EmbeddingProviderKind::Ollama => Ok(()),
            EmbeddingProviderKind::OpenAi => match &self.openai.api_key {
                Some(key) if !key.is_empty() => Ok(()),
                _ => Err(ConfigError::MissingApiKey("openai")),
            },
            EmbeddingProviderKind::Voyage => match &self.voyage.api_key {
                Some(key) if !key.is_empty() => Ok(()),
                _ => Err(ConfigError::MissingApiKey("voyage")),
            },
        }
    }
}
