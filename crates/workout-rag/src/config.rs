//! Configuration for the workout RAG service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RagConfig {
    /// Provider backend (ollama or openai-compatible)
    #[serde(default)]
    pub backend: BackendProvider,
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval profiles
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Conversation memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,
    /// On-disk storage locations
    #[serde(default)]
    pub storage: StorageConfig,
}

impl RagConfig {
    /// Load configuration from an optional TOML file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                let raw = std::fs::read_to_string(path)?;
                toml::from_str(&raw).map_err(|e| {
                    Error::Config(format!("Invalid config file {}: {}", path.display(), e))
                })?
            }
            Some(path) => {
                tracing::warn!("Config file {} not found, using defaults", path.display());
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `WORKOUT_RAG_*` environment overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("WORKOUT_RAG_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("WORKOUT_RAG_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid WORKOUT_RAG_PORT: {}", port)))?;
        }
        if let Ok(url) = std::env::var("WORKOUT_RAG_LLM_URL") {
            self.llm.base_url = url;
        }
        if let Ok(key) = std::env::var("WORKOUT_RAG_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Ok(backend) = std::env::var("WORKOUT_RAG_BACKEND") {
            self.backend = match backend.to_lowercase().as_str() {
                "ollama" => BackendProvider::Ollama,
                "openai" => BackendProvider::OpenAi,
                other => {
                    return Err(Error::Config(format!("Unknown backend: {}", other)));
                }
            };
        }
        Ok(())
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be non-zero".to_string()));
        }
        if self.chunking.chunk_size == 0 || self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        for (name, profile) in [("chat", &self.retrieval.chat), ("plan", &self.retrieval.plan)] {
            if profile.k == 0 {
                return Err(Error::Config(format!("retrieval.{}.k must be at least 1", name)));
            }
            if !(0.0..=1.0).contains(&profile.lambda_mult) {
                return Err(Error::Config(format!(
                    "retrieval.{}.lambda_mult must be within [0, 1], got {}",
                    name, profile.lambda_mult
                )));
            }
        }
        if self.backend == BackendProvider::OpenAi && self.llm.api_key.is_none() {
            tracing::warn!("OpenAI-compatible backend selected without an API key");
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
    /// Directory uploaded documents are written to
    pub upload_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
            upload_dir: data_dir().join("files"),
        }
    }
}

/// LLM configuration, shared by the chat and embedding endpoints of one backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL (`http://localhost:11434` for Ollama, `.../v1` for OpenAI-compatible)
    pub base_url: String,
    /// Bearer token for OpenAI-compatible endpoints
    #[serde(default)]
    pub api_key: Option<String>,
    /// Embedding model name
    pub embed_model: String,
    /// Generation model name
    pub generate_model: String,
    /// Temperature for conversational answers
    pub chat_temperature: f32,
    /// Temperature for plan generation and adjustment
    pub plan_temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            api_key: None,
            embed_model: "nomic-embed-text".to_string(),
            generate_model: "llama3.2:3b".to_string(),
            chat_temperature: 0.7,
            plan_temperature: 0.3, // Low drift in the JSON contract
            timeout_secs: 120,
            max_retries: 2,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding dimensions (768 for nomic-embed-text, 1536 for ada-002)
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { dimensions: 768 }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            chunk_overlap: 150,
        }
    }
}

/// MMR retrieval parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RetrievalProfile {
    /// Number of chunks returned
    pub k: usize,
    /// Size of the candidate pool MMR selects from
    pub fetch_k: usize,
    /// Relevance/diversity trade-off (1.0 = pure relevance)
    pub lambda_mult: f32,
}

/// Retrieval profiles for the two query paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Conversational QA
    pub chat: RetrievalProfile,
    /// Plan generation (less context needed)
    pub plan: RetrievalProfile,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chat: RetrievalProfile {
                k: 5,
                fetch_k: 20,
                lambda_mult: 0.7,
            },
            plan: RetrievalProfile {
                k: 3,
                fetch_k: 10,
                lambda_mult: 0.7,
            },
        }
    }
}

/// Conversation memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Question/answer exchanges kept per session
    pub max_turns: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { max_turns: 20 }
    }
}

/// Storage locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database for chat transcripts
    pub database_path: PathBuf,
    /// JSON snapshot of the in-process vector index (None = memory only)
    pub index_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = data_dir();
        Self {
            database_path: dir.join("chat_history.db"),
            index_path: Some(dir.join("vector_index.json")),
        }
    }
}

/// Backend provider selection
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BackendProvider {
    /// Local Ollama server
    #[default]
    Ollama,
    /// Any OpenAI-compatible endpoint
    OpenAi,
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("workout-rag")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RagConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunking.chunk_size, 1200);
        assert_eq!(config.chunking.chunk_overlap, 150);
        assert_eq!(config.retrieval.chat.k, 5);
        assert_eq!(config.retrieval.plan.fetch_k, 10);
        assert!((config.llm.plan_temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = 1200;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_lambda_out_of_range() {
        let mut config = RagConfig::default();
        config.retrieval.chat.lambda_mult = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let raw = r#"
            backend = "openai"

            [llm]
            base_url = "https://api.example.com/v1"
            api_key = "sk-test"
            embed_model = "text-embedding-ada-002"
            generate_model = "gpt-3.5-turbo"
            chat_temperature = 0.7
            plan_temperature = 0.3
            timeout_secs = 60
            max_retries = 1
        "#;
        let config: RagConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.backend, BackendProvider::OpenAi);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.chunking.chunk_size, 1200);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nhost = \"127.0.0.1\"\nport = 9000\nenable_cors = false\nmax_upload_size = 1024\nupload_dir = \"files\"\n").unwrap();

        let config = RagConfig::load(Some(&path)).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(!config.server.enable_cors);
    }
}
