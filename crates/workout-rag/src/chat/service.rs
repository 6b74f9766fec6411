//! Conversational question answering over the indexed documents

use futures::StreamExt;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::config::RetrievalProfile;
use crate::error::{Error, Result};
use crate::generation::{GenerationClient, PromptComposer};
use crate::providers::ScoredChunk;
use crate::retrieval::{RetrievalOptions, Retriever};
use crate::storage::{run_blocking, ChatTranscriptStore};
use crate::types::{ChatRole, SearchRequest, SearchResponse, SourceRef};

use super::memory::ConversationMemory;

const EVENT_BUFFER: usize = 64;

/// One event of a streamed answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerEvent {
    /// Next piece of the answer text, in generation order
    Fragment(String),
    /// Distinct cited file names, sorted
    Sources(Vec<String>),
    /// Answer complete
    Done,
    /// Terminal failure; nothing follows
    Error(String),
}

/// Receiving end of a streamed answer.
///
/// Dropping it cancels the producer at its next send.
pub struct AnswerStream {
    rx: mpsc::Receiver<AnswerEvent>,
}

impl AnswerStream {
    pub async fn next(&mut self) -> Option<AnswerEvent> {
        self.rx.recv().await
    }

    /// Drain the stream into the answer text and cited sources
    pub async fn collect(mut self) -> Result<(String, Vec<String>)> {
        let mut answer = String::new();
        let mut sources = Vec::new();
        while let Some(event) = self.next().await {
            match event {
                AnswerEvent::Fragment(fragment) => answer.push_str(&fragment),
                AnswerEvent::Sources(names) => sources = names,
                AnswerEvent::Done => break,
                AnswerEvent::Error(message) => return Err(Error::generation(message)),
            }
        }
        Ok((answer, sources))
    }
}

/// `"\n\nSource PDF:\n\n**a.pdf**\n**b.pdf**"`, or empty without sources
pub fn format_sources_block(sources: &[String]) -> String {
    if sources.is_empty() {
        return String::new();
    }
    let names: Vec<String> = sources.iter().map(|s| format!("**{}**", s)).collect();
    format!("\n\nSource PDF:\n\n{}", names.join("\n"))
}

fn cited_files(chunks: &[ScoredChunk]) -> Vec<String> {
    chunks
        .iter()
        .map(|c| c.chunk.source_file_path.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Chat over the document index with per-session memory
#[derive(Clone)]
pub struct ChatService {
    retriever: Retriever,
    client: GenerationClient,
    memory: Arc<ConversationMemory>,
    transcripts: Option<Arc<dyn ChatTranscriptStore>>,
    retrieval: RetrievalOptions,
}

impl ChatService {
    pub fn new(
        retriever: Retriever,
        client: GenerationClient,
        memory: Arc<ConversationMemory>,
        profile: RetrievalProfile,
    ) -> Self {
        Self {
            retriever,
            client,
            memory,
            transcripts: None,
            retrieval: profile.into(),
        }
    }

    /// Persist every exchange to a transcript store (best effort)
    pub fn with_transcripts(mut self, store: Arc<dyn ChatTranscriptStore>) -> Self {
        self.transcripts = Some(store);
        self
    }

    pub fn memory(&self) -> &Arc<ConversationMemory> {
        &self.memory
    }

    /// Answer `question` in the context of `session_id`, streaming the reply.
    ///
    /// Events arrive as fragments, then the cited sources, then `Done`. A
    /// retrieval or provider failure ends the stream with `Error`.
    pub fn answer_query(&self, session_id: &str, question: &str) -> Result<AnswerStream> {
        let question = question.trim();
        if question.is_empty() {
            return Err(Error::validation("Question must not be empty"));
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let service = self.clone();
        let session_id = session_id.to_string();
        let question = question.to_string();

        tokio::spawn(async move {
            if let Err(e) = service.produce_answer(&session_id, &question, &tx).await {
                tracing::error!("Chat answer failed for session {}: {}", session_id, e);
                let _ = tx.send(AnswerEvent::Error(e.to_string())).await;
            }
        });

        Ok(AnswerStream { rx })
    }

    async fn produce_answer(
        &self,
        session_id: &str,
        question: &str,
        tx: &mpsc::Sender<AnswerEvent>,
    ) -> Result<()> {
        self.persist(session_id, ChatRole::User, question).await;

        let chunks = self.retriever.retrieve(question, &self.retrieval).await?;
        let history = self.memory.history(session_id);
        let prompt = PromptComposer::chat_qa(&chunks, &history, question);

        let mut fragments = self.client.stream(&prompt).await?;
        let mut answer = String::new();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            answer.push_str(&fragment);
            if tx.send(AnswerEvent::Fragment(fragment)).await.is_err() {
                tracing::debug!("Client left session {} mid-answer, abandoning generation", session_id);
                return Ok(());
            }
        }

        let sources = cited_files(&chunks);
        self.memory.record(session_id, question, answer.as_str());
        self.persist(
            session_id,
            ChatRole::Assistant,
            &format!("{}{}", answer, format_sources_block(&sources)),
        )
        .await;
        tracing::info!(
            "Answered question for session {} ({} chars, {} sources)",
            session_id,
            answer.len(),
            sources.len()
        );

        if tx.send(AnswerEvent::Sources(sources)).await.is_ok() {
            let _ = tx.send(AnswerEvent::Done).await;
        }
        Ok(())
    }

    /// Non-streaming answer, optionally restricted to one document
    pub async fn filtered_search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(Error::validation("Query must not be empty"));
        }

        let mut options = self.retrieval.clone();
        if let Some(name) = request.document_name.as_deref().filter(|n| !n.trim().is_empty()) {
            options = options.with_source(name.trim());
        }

        let chunks = self.retriever.retrieve(query, &options).await?;
        let prompt = PromptComposer::chat_qa(&chunks, &[], query);
        let answer = self
            .client
            .complete(&prompt, self.client.chat_temperature())
            .await?;

        let sources = chunks
            .iter()
            .map(|c| SourceRef {
                file_name: c.chunk.source_file_path.clone(),
                page: c.chunk.page_label(),
            })
            .collect();

        Ok(SearchResponse {
            answer: answer.trim().to_string(),
            sources,
        })
    }

    /// Forget a session's memory and stored transcript
    pub async fn clear_session(&self, session_id: &str) -> Result<usize> {
        self.memory.reset(session_id);
        match &self.transcripts {
            Some(store) => {
                let session_id = session_id.to_string();
                run_blocking(Arc::clone(store), move |store| store.clear(&session_id)).await
            }
            None => Ok(0),
        }
    }

    async fn persist(&self, session_id: &str, role: ChatRole, message: &str) {
        let Some(store) = &self.transcripts else {
            return;
        };
        let session = session_id.to_string();
        let message = message.to_string();
        let result =
            run_blocking(Arc::clone(store), move |store| store.append(&session, role, &message)).await;
        if let Err(e) = result {
            tracing::warn!("Failed to store {} message for {}: {}", role.as_str(), session_id, e);
        }
    }
}
