//! Ingestion pipeline orchestration

use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::providers::{EmbeddedChunk, EmbeddingProvider, VectorStoreProvider};
use crate::types::{source_identity, FileType};

use super::chunker::TextChunker;
use super::parser::DocumentParser;

/// Writer lock around the index's mutating operations.
///
/// Ingestions share it (they may overlap each other); a clear takes it
/// exclusively, so it waits for in-flight ingestions and blocks new ones.
pub type IndexLock = Arc<RwLock<()>>;

/// Outcome of a successful ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    /// Document identity (basename)
    pub source_file_path: String,
    pub chunks: usize,
    pub pages: usize,
}

/// Main ingestion pipeline
pub struct IngestPipeline {
    parser: Arc<dyn DocumentParser>,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStoreProvider>,
    index_lock: IndexLock,
    /// Where uploaded originals are kept (None = not kept)
    upload_dir: Option<PathBuf>,
}

impl IngestPipeline {
    /// Create a new ingestion pipeline
    pub fn new(
        parser: Arc<dyn DocumentParser>,
        chunker: TextChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStoreProvider>,
    ) -> Self {
        Self {
            parser,
            chunker,
            embedder,
            store,
            index_lock: Arc::new(RwLock::new(())),
            upload_dir: None,
        }
    }

    /// Keep uploaded originals in `dir`
    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(dir.into());
        self
    }

    /// Share an existing index lock
    pub fn with_index_lock(mut self, lock: IndexLock) -> Self {
        self.index_lock = lock;
        self
    }

    pub fn index_lock(&self) -> IndexLock {
        Arc::clone(&self.index_lock)
    }

    /// Full ingestion: parse + chunk + embed + upsert.
    ///
    /// Nothing is written to the index unless every step succeeds.
    /// The original is kept under the upload directory when one is set.
    pub async fn ingest_document(&self, filename: &str, data: Vec<u8>) -> Result<IngestReport> {
        let source = source_identity(filename);
        if source.is_empty() {
            return Err(Error::validation("A file name is required"));
        }
        let file_type = FileType::from_filename(&source);
        if !file_type.is_supported() {
            return Err(Error::UnsupportedFileType(source));
        }

        let _guard = self.index_lock.read().await;
        tracing::info!("Ingesting {} ({} bytes)", source, data.len());

        let data = Bytes::from(data);

        // PDF extraction is CPU-bound
        let parser = Arc::clone(&self.parser);
        let name = source.clone();
        let bytes = data.clone();
        let pages = tokio::task::spawn_blocking(move || parser.parse(&name, &bytes))
            .await
            .map_err(|e| Error::internal(format!("Parser task failed: {}", e)))??;

        let chunks = self.chunker.chunk_pages(&source, file_type, &pages);
        if chunks.is_empty() {
            return Err(Error::file_parse(&source, "Document contains no text to index"));
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let report = IngestReport {
            source_file_path: source.clone(),
            chunks: chunks.len(),
            pages: pages.len(),
        };

        // The original is stored first so a failed write leaves nothing indexed
        let stored_upload = match &self.upload_dir {
            Some(dir) => Some(store_upload(dir, &source, &data).await?),
            None => None,
        };

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddedChunk { chunk, embedding })
            .collect();
        if let Err(e) = self.store.upsert(entries).await {
            if let Some(StoredUpload { path, replaced: false }) = stored_upload {
                if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                    tracing::warn!("Could not remove {} after failed indexing: {}", path.display(), cleanup);
                }
            }
            return Err(e);
        }

        tracing::info!(
            "Indexed {}: {} chunks from {} pages",
            report.source_file_path,
            report.chunks,
            report.pages
        );
        Ok(report)
    }

    /// Ingest a file from disk
    pub async fn ingest_path(&self, path: &Path) -> Result<IngestReport> {
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::validation(format!("Invalid file name: {}", path.display())))?;
        self.ingest_document(filename, data).await
    }

    /// Distinct document identities currently indexed
    pub async fn list_documents(&self) -> Result<Vec<String>> {
        self.store.list_sources().await
    }

    /// Process-wide clear of the index and stored uploads
    pub async fn clear_documents(&self) -> Result<usize> {
        let _guard = self.index_lock.write().await;

        let removed = self.store.clear_all().await?;
        if let Some(dir) = &self.upload_dir {
            remove_dir_files(dir).await?;
        }

        tracing::info!("Cleared {} chunks from the index", removed);
        Ok(removed)
    }
}

struct StoredUpload {
    path: PathBuf,
    /// A same-named upload already existed and was overwritten
    replaced: bool,
}

async fn store_upload(dir: &Path, source: &str, data: &[u8]) -> Result<StoredUpload> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(source);
    let replaced = tokio::fs::try_exists(&path).await?;
    tokio::fs::write(&path, data).await?;
    Ok(StoredUpload { path, replaced })
}

async fn remove_dir_files(dir: &Path) -> Result<()> {
    if !tokio::fs::try_exists(dir).await? {
        return Ok(());
    }
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            tokio::fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}
