//! Generation client: composed prompts in, text out

use std::sync::Arc;

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::providers::{LlmProvider, TextStream};

use super::prompt::ComposedPrompt;

/// Wraps an [`LlmProvider`] with the temperatures used by each path
#[derive(Clone)]
pub struct GenerationClient {
    llm: Arc<dyn LlmProvider>,
    chat_temperature: f32,
    plan_temperature: f32,
}

impl GenerationClient {
    pub fn new(llm: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            llm,
            chat_temperature: config.chat_temperature,
            plan_temperature: config.plan_temperature,
        }
    }

    pub fn chat_temperature(&self) -> f32 {
        self.chat_temperature
    }

    pub fn plan_temperature(&self) -> f32 {
        self.plan_temperature
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Full completion; every provider failure becomes [`Error::Generation`]
    pub async fn complete(&self, prompt: &ComposedPrompt, temperature: f32) -> Result<String> {
        tracing::debug!(
            "Generating with {} ({} chars, temperature {})",
            self.llm.model(),
            prompt.user.len(),
            temperature
        );
        self.llm
            .complete(&prompt.to_messages(), temperature)
            .await
            .map_err(as_generation_error)
    }

    /// Streaming completion at the chat temperature
    pub async fn stream(&self, prompt: &ComposedPrompt) -> Result<TextStream> {
        self.llm
            .complete_stream(&prompt.to_messages(), self.chat_temperature)
            .await
            .map_err(as_generation_error)
    }
}

fn as_generation_error(error: Error) -> Error {
    match error {
        Error::Generation(_) => error,
        other => Error::generation(other.to_string()),
    }
}
