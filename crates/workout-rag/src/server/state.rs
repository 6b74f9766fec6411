//! Application state for the workout RAG server

use std::sync::Arc;

use crate::chat::{ChatService, ConversationMemory};
use crate::config::{BackendProvider, RagConfig};
use crate::error::Result;
use crate::generation::GenerationClient;
use crate::ingestion::{FileParser, IngestPipeline, TextChunker};
use crate::planning::PlanPipeline;
use crate::providers::{
    EmbeddingProvider, InMemoryVectorStore, LlmProvider, OllamaClient, OpenAiClient,
    VectorStoreProvider,
};
use crate::retrieval::Retriever;
use crate::storage::{ChatTranscriptStore, SqliteTranscriptStore};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    /// LLM provider (Ollama or OpenAI-compatible)
    llm_provider: Arc<dyn LlmProvider>,
    /// Vector index shared by ingestion and retrieval
    vector_store: Arc<dyn VectorStoreProvider>,
    /// Chat transcripts (SQLite)
    transcripts: Arc<dyn ChatTranscriptStore>,
    ingest: IngestPipeline,
    chat: ChatService,
    planner: PlanPipeline,
}

impl AppState {
    /// Build providers for the configured backend and wire the pipelines
    pub async fn new(config: RagConfig) -> Result<Self> {
        tracing::info!("Initializing workout RAG state (backend: {:?})...", config.backend);

        let (embedding_provider, llm_provider): (Arc<dyn EmbeddingProvider>, Arc<dyn LlmProvider>) =
            match config.backend {
                BackendProvider::Ollama => {
                    let client = Arc::new(OllamaClient::new(&config.llm, config.embeddings.dimensions)?);
                    tracing::info!(
                        "Using Ollama at {} (embed: {}, generate: {})",
                        config.llm.base_url,
                        config.llm.embed_model,
                        config.llm.generate_model
                    );
                    (client.clone(), client)
                }
                BackendProvider::OpenAi => {
                    let client = Arc::new(OpenAiClient::new(&config.llm, config.embeddings.dimensions)?);
                    tracing::info!(
                        "Using OpenAI-compatible endpoint {} (embed: {}, generate: {})",
                        config.llm.base_url,
                        config.llm.embed_model,
                        config.llm.generate_model
                    );
                    (client.clone(), client)
                }
            };

        let vector_store: Arc<dyn VectorStoreProvider> = match &config.storage.index_path {
            Some(path) => Arc::new(InMemoryVectorStore::with_snapshot(path)?),
            None => Arc::new(InMemoryVectorStore::new()),
        };
        tracing::info!("Vector index ready ({} chunks)", vector_store.len().await?);

        let transcripts = Arc::new(SqliteTranscriptStore::new(&config.storage.database_path)?);
        tracing::info!("Chat transcripts at {}", config.storage.database_path.display());

        match llm_provider.health_check().await {
            Ok(true) => tracing::info!("LLM backend reachable"),
            _ => tracing::warn!(
                "LLM backend not reachable at {}; plan requests will fall back to the default plan",
                config.llm.base_url
            ),
        }

        Ok(Self::from_providers(
            config,
            embedding_provider,
            llm_provider,
            vector_store,
            transcripts,
        ))
    }

    /// Wire the pipelines over already-built providers
    pub fn from_providers(
        config: RagConfig,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        llm_provider: Arc<dyn LlmProvider>,
        vector_store: Arc<dyn VectorStoreProvider>,
        transcripts: Arc<dyn ChatTranscriptStore>,
    ) -> Self {
        let ingest = IngestPipeline::new(
            Arc::new(FileParser::new()),
            TextChunker::from_config(&config.chunking),
            embedding_provider.clone(),
            vector_store.clone(),
        )
        .with_upload_dir(config.server.upload_dir.clone());

        let retriever = Retriever::new(embedding_provider, vector_store.clone());
        let client = GenerationClient::new(llm_provider.clone(), &config.llm);

        let chat = ChatService::new(
            retriever.clone(),
            client.clone(),
            Arc::new(ConversationMemory::new(config.memory.max_turns)),
            config.retrieval.chat,
        )
        .with_transcripts(transcripts.clone());

        let planner = PlanPipeline::new(retriever, client, config.retrieval.plan);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                llm_provider,
                vector_store,
                transcripts,
                ingest,
                chat,
                planner,
            }),
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    pub fn llm_provider(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm_provider
    }

    pub fn vector_store(&self) -> &Arc<dyn VectorStoreProvider> {
        &self.inner.vector_store
    }

    pub fn transcripts(&self) -> &Arc<dyn ChatTranscriptStore> {
        &self.inner.transcripts
    }

    pub fn ingest(&self) -> &IngestPipeline {
        &self.inner.ingest
    }

    pub fn chat(&self) -> &ChatService {
        &self.inner.chat
    }

    pub fn planner(&self) -> &PlanPipeline {
        &self.inner.planner
    }
}
