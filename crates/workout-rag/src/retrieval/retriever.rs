//! Query embedding + MMR search against the vector index

use std::sync::Arc;

use crate::config::RetrievalProfile;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, ScoredChunk, VectorQuery, VectorStoreProvider};

/// Per-call retrieval parameters
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalOptions {
    pub k: usize,
    pub fetch_k: usize,
    pub lambda_mult: f32,
    /// Restrict candidates to one document identity
    pub source_filter: Option<String>,
}

impl RetrievalOptions {
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_filter = Some(source.into());
        self
    }
}

impl From<RetrievalProfile> for RetrievalOptions {
    fn from(profile: RetrievalProfile) -> Self {
        Self {
            k: profile.k,
            fetch_k: profile.fetch_k,
            lambda_mult: profile.lambda_mult,
            source_filter: None,
        }
    }
}

/// Retriever over an optional vector index.
///
/// Without an index every call reports `RetrievalUnavailable`, which plan
/// generation treats as a signal to skip straight to its plain prompt.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Option<Arc<dyn VectorStoreProvider>>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStoreProvider>) -> Self {
        Self {
            embedder,
            store: Some(store),
        }
    }

    /// Retriever with no index configured
    pub fn unavailable(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            store: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.store.is_some()
    }

    /// Retrieve up to `options.k` chunks by maximal marginal relevance.
    ///
    /// An empty index or a filter that matches nothing yields an empty list.
    pub async fn retrieve(&self, query: &str, options: &RetrievalOptions) -> Result<Vec<ScoredChunk>> {
        let store = self
            .store
            .as_ref()
            .ok_or_else(|| Error::RetrievalUnavailable("No vector index configured".to_string()))?;

        if options.k == 0 || store.is_empty().await? {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await?;
        let vector_query = VectorQuery {
            k: options.k,
            fetch_k: options.fetch_k,
            lambda_mult: options.lambda_mult,
            source_filter: options.source_filter.clone(),
        };
        let results = store.query(&embedding, &vector_query).await?;

        tracing::debug!(
            "Retrieved {} chunks (k={}, fetch_k={}, lambda={}, filter={:?})",
            results.len(),
            options.k,
            options.fetch_k,
            options.lambda_mult,
            options.source_filter
        );
        Ok(results)
    }
}
