//! LLM completion provider trait

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ChatRole;

/// One message of a chat-style completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered, finite stream of generated text fragments
pub type TextStream = BoxStream<'static, Result<String>>;

/// Trait for LLM text completion
///
/// Implementations:
/// - `OllamaClient`: Local Ollama server (`/api/chat`)
/// - `OpenAiClient`: OpenAI-compatible `/chat/completions`
/// - `ScriptedLlm`: queued replies for tests
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a conversation and return the full reply
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String>;

    /// Complete a conversation, yielding fragments in generation order
    ///
    /// The stream is not restartable; calling again re-runs the prompt.
    async fn complete_stream(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
    ) -> Result<TextStream>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
