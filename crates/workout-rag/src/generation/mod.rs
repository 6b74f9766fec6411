//! Prompt composition, LLM calls and structured-output recovery

mod client;
mod extract;
pub mod prompt;

pub use client::GenerationClient;
pub use extract::extract_json;
pub use prompt::{ComposedPrompt, PromptComposer};
