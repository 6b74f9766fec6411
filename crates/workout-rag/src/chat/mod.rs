//! Conversational path: session memory and streamed answers

mod memory;
mod service;

pub use memory::ConversationMemory;
pub use service::{format_sources_block, AnswerEvent, AnswerStream, ChatService};
