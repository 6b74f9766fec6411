//! In-process vector index with MMR selection
//!
//! Brute-force cosine similarity over every stored embedding. Suitable for
//! the corpus sizes this service handles (a handful of training PDFs). The
//! index can be snapshotted to a JSON file so it survives restarts.
//!
//! Mutations are serialized and the snapshot is written before the new
//! state is installed in memory, so a failed write leaves the index as it was.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::retrieval::mmr;

use super::vector_store::{EmbeddedChunk, ScoredChunk, VectorQuery, VectorStoreProvider};

/// In-memory vector store
pub struct InMemoryVectorStore {
    entries: RwLock<Vec<EmbeddedChunk>>,
    snapshot_path: Option<PathBuf>,
    /// Held across a whole mutation, snapshot write included
    write_lock: Mutex<()>,
}

impl InMemoryVectorStore {
    /// Create an empty, memory-only store
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            snapshot_path: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store backed by a JSON snapshot, loading it if present
    pub fn with_snapshot(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let raw = std::fs::read(&path)?;
            let entries: Vec<EmbeddedChunk> = serde_json::from_slice(&raw).map_err(|e| {
                Error::vector_store(format!("Corrupt index snapshot {}: {}", path.display(), e))
            })?;
            tracing::info!("Loaded {} chunks from {}", entries.len(), path.display());
            entries
        } else {
            Vec::new()
        };

        Ok(Self {
            entries: RwLock::new(entries),
            snapshot_path: Some(path),
            write_lock: Mutex::new(()),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Write `bytes` as the snapshot. Callers hold `write_lock`.
    async fn write_snapshot(&self, bytes: Vec<u8>) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        tracing::debug!("Index snapshot written to {}", path.display());
        Ok(())
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStoreProvider for InMemoryVectorStore {
    async fn upsert(&self, chunks: Vec<EmbeddedChunk>) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let _write = self.write_lock.lock().await;

        let snapshot = {
            let entries = self.entries.read();
            let expected = entries
                .first()
                .or_else(|| chunks.first())
                .map(|e| e.embedding.len());
            if let Some(bad) = chunks
                .iter()
                .find(|c| Some(c.embedding.len()) != expected)
            {
                return Err(Error::vector_store(format!(
                    "Embedding dimension mismatch: expected {}, got {}",
                    expected.unwrap_or_default(),
                    bad.embedding.len()
                )));
            }

            match &self.snapshot_path {
                Some(_) => {
                    let all: Vec<&EmbeddedChunk> = entries.iter().chain(chunks.iter()).collect();
                    Some(serde_json::to_vec(&all)?)
                }
                None => None,
            }
        };

        if let Some(bytes) = snapshot {
            self.write_snapshot(bytes).await?;
        }

        // Same-named documents accumulate; only a clear removes chunks
        self.entries.write().extend(chunks);
        Ok(())
    }

    async fn query(&self, embedding: &[f32], query: &VectorQuery) -> Result<Vec<ScoredChunk>> {
        let entries = self.entries.read();

        let pool: Vec<&EmbeddedChunk> = entries
            .iter()
            .filter(|e| match &query.source_filter {
                Some(source) => &e.chunk.source_file_path == source,
                None => true,
            })
            .collect();

        let candidates = mmr::top_candidates(
            embedding,
            pool.iter().map(|e| e.embedding.as_slice()),
            query.fetch_k,
        );
        let candidate_embeddings: Vec<&[f32]> = candidates
            .iter()
            .map(|(idx, _)| pool[*idx].embedding.as_slice())
            .collect();

        let picked = mmr::select(embedding, &candidate_embeddings, query.k, query.lambda_mult);

        Ok(picked
            .into_iter()
            .map(|pos| {
                let (idx, score) = candidates[pos];
                ScoredChunk {
                    chunk: pool[idx].chunk.clone(),
                    score,
                }
            })
            .collect())
    }

    async fn clear_all(&self) -> Result<usize> {
        let _write = self.write_lock.lock().await;

        if self.snapshot_path.is_some() {
            self.write_snapshot(b"[]".to_vec()).await?;
        }

        let mut entries = self.entries.write();
        let removed = entries.len();
        entries.clear();
        Ok(removed)
    }

    async fn list_sources(&self) -> Result<Vec<String>> {
        let entries = self.entries.read();
        let sources: BTreeSet<String> = entries
            .iter()
            .map(|e| e.chunk.source_file_path.clone())
            .collect();
        Ok(sources.into_iter().collect())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.entries.read().len())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DocumentChunk, FileType};

    fn entry(source: &str, chunk_id: u32, embedding: Vec<f32>) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: DocumentChunk {
                text: format!("{} #{}", source, chunk_id),
                source_file_path: source.to_string(),
                chunk_id,
                file_type: FileType::Pdf,
                page_number: Some(1),
                total_chunks: 2,
            },
            embedding,
        }
    }

    fn query(k: usize, fetch_k: usize) -> VectorQuery {
        VectorQuery {
            k,
            fetch_k,
            lambda_mult: 0.7,
            source_filter: None,
        }
    }

    #[tokio::test]
    async fn test_empty_store_returns_nothing() {
        let store = InMemoryVectorStore::new();
        let results = store.query(&[1.0, 0.0], &query(5, 20)).await.unwrap();
        assert!(results.is_empty());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test]
    async fn test_filter_applies_before_selection() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                entry("a.pdf", 0, vec![1.0, 0.0]),
                entry("b.pdf", 0, vec![0.9, 0.1]),
                entry("b.pdf", 1, vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let mut q = query(5, 20);
        q.source_filter = Some("b.pdf".to_string());
        let results = store.query(&[1.0, 0.0], &q).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.chunk.source_file_path == "b.pdf"));

        q.source_filter = Some("missing.pdf".to_string());
        assert!(store.query(&[1.0, 0.0], &q).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_k_smaller_than_k() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                entry("a.pdf", 0, vec![1.0, 0.0]),
                entry("a.pdf", 1, vec![0.5, 0.5]),
                entry("b.pdf", 0, vec![0.0, 1.0]),
            ])
            .await
            .unwrap();
        let results = store.query(&[1.0, 0.0], &query(5, 2)).await.unwrap();
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_same_source_upserts_accumulate() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![entry("a.pdf", 0, vec![1.0, 0.0]), entry("a.pdf", 1, vec![0.0, 1.0])])
            .await
            .unwrap();
        store.upsert(vec![entry("a.pdf", 0, vec![1.0, 0.0])]).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 3);
        assert_eq!(store.list_sources().await.unwrap(), vec!["a.pdf"]);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_rejected() {
        let store = InMemoryVectorStore::new();
        store.upsert(vec![entry("a.pdf", 0, vec![1.0, 0.0])]).await.unwrap();
        let err = store.upsert(vec![entry("b.pdf", 0, vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, Error::VectorStore(_)));
    }

    #[tokio::test]
    async fn test_list_and_clear() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![entry("b.pdf", 0, vec![1.0, 0.0]), entry("a.pdf", 0, vec![0.0, 1.0])])
            .await
            .unwrap();
        assert_eq!(store.list_sources().await.unwrap(), vec!["a.pdf", "b.pdf"]);
        assert_eq!(store.clear_all().await.unwrap(), 2);
        assert!(store.list_sources().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index").join("vectors.json");

        let store = InMemoryVectorStore::with_snapshot(&path).unwrap();
        store.upsert(vec![entry("a.pdf", 0, vec![1.0, 0.0])]).await.unwrap();
        assert!(path.exists());

        let reloaded = InMemoryVectorStore::with_snapshot(&path).unwrap();
        assert_eq!(reloaded.list_sources().await.unwrap(), vec!["a.pdf"]);
    }

    #[tokio::test]
    async fn test_failed_snapshot_leaves_index_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();

        let store = InMemoryVectorStore::with_snapshot(blocker.join("vectors.json")).unwrap();
        assert!(store.upsert(vec![entry("a.pdf", 0, vec![1.0, 0.0])]).await.is_err());
        assert!(store.is_empty().await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_upserts_with_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.json");
        let store = std::sync::Arc::new(InMemoryVectorStore::with_snapshot(&path).unwrap());

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .upsert(vec![entry(&format!("doc-{}.pdf", i), 0, vec![1.0, i as f32])])
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(store.len().await.unwrap(), 32);
        let reloaded = InMemoryVectorStore::with_snapshot(&path).unwrap();
        assert_eq!(reloaded.list_sources().await.unwrap().len(), 32);
    }
}
