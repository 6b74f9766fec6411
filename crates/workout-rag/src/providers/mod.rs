//! Provider abstractions for embeddings, LLM completion and vector storage
//!
//! Trait-based seams let the pipeline switch between a local Ollama server
//! and any OpenAI-compatible endpoint, and run fully offline in tests.

pub mod embedding;
pub mod llm;
pub mod memory;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod transport;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use llm::{ChatMessage, LlmProvider, TextStream};
pub use memory::InMemoryVectorStore;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use vector_store::{EmbeddedChunk, ScoredChunk, VectorQuery, VectorStoreProvider};
