//! Persistent storage for chat transcripts

mod transcript;

pub use transcript::{run_blocking, ChatTranscriptStore, SqliteTranscriptStore};
