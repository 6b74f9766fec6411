//! workout-rag: retrieval-augmented workout planning and document Q&A
//!
//! Uploaded PDFs are chunked, embedded and indexed. Questions are answered
//! over that index with per-session memory, and structured weekly workout
//! plans are generated from a user profile with a fallback chain that always
//! yields a usable plan.

pub mod chat;
pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod planning;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod storage;
pub mod types;

pub use chat::{AnswerEvent, AnswerStream, ChatService, ConversationMemory};
pub use config::RagConfig;
pub use error::{Error, Result};
pub use generation::{extract_json, GenerationClient, PromptComposer};
pub use ingestion::{IngestPipeline, TextChunker};
pub use planning::{extract_insights, PlanPipeline};
pub use retrieval::{RetrievalOptions, Retriever};
pub use types::{ChatInsightSet, DocumentChunk, UserProfile, Weekday, WorkoutPlan};
