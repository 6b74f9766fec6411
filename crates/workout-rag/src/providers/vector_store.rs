//! Vector store provider trait for storing and searching embeddings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::DocumentChunk;

/// A chunk paired with the embedding of its text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedChunk {
    pub chunk: DocumentChunk,
    pub embedding: Vec<f32>,
}

/// Search result from vector store
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    /// The matched chunk
    pub chunk: DocumentChunk,
    /// Cosine similarity to the query (higher is more similar)
    pub score: f32,
}

/// MMR query parameters
#[derive(Debug, Clone, Default)]
pub struct VectorQuery {
    /// Number of results to select
    pub k: usize,
    /// Candidate pool size
    pub fetch_k: usize,
    /// Relevance/diversity trade-off in [0, 1]
    pub lambda_mult: f32,
    /// Only consider chunks whose `source_file_path` equals this value
    pub source_filter: Option<String>,
}

/// Trait for vector storage and diversity-aware similarity search
///
/// Implementations:
/// - `InMemoryVectorStore`: brute-force cosine with MMR, optional JSON snapshot
#[async_trait]
pub trait VectorStoreProvider: Send + Sync {
    /// Insert chunks with their embeddings
    async fn upsert(&self, chunks: Vec<EmbeddedChunk>) -> Result<()>;

    /// Select up to `k` chunks by maximal marginal relevance
    async fn query(&self, embedding: &[f32], query: &VectorQuery) -> Result<Vec<ScoredChunk>>;

    /// Remove every chunk from the index
    async fn clear_all(&self) -> Result<usize>;

    /// Distinct `source_file_path` values, sorted
    async fn list_sources(&self) -> Result<Vec<String>>;

    /// Get total number of vectors stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}
