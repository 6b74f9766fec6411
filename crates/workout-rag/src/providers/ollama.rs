//! Ollama client for embeddings and chat completion with retry logic

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{ChatMessage, LlmProvider, TextStream};
use super::transport::{lines, retry_request};

/// Ollama API client with automatic retry
///
/// One client serves both the embedding and the completion trait.
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: LlmConfig,
    /// Embedding dimensions reported to the index
    dimensions: usize,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: ChatOptions,
}

#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &LlmConfig, dimensions: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
            dimensions,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    async fn send_chat(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        stream: bool,
    ) -> Result<reqwest::Response> {
        let url = self.url("/api/chat");
        let request = ChatRequest {
            model: &self.config.generate_model,
            messages,
            stream,
            options: ChatOptions { temperature },
        };

        let (client, url, request) = (&self.client, &url, &request);
        retry_request(self.config.max_retries, || async move {
            let response = client
                .post(url)
                .json(request)
                .send()
                .await
                .map_err(|e| Error::generation(format!("Chat request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::generation(format!(
                    "Chat failed: HTTP {} - {}",
                    status, body
                )));
            }
            Ok(response)
        })
        .await
    }
}

/// Content of one NDJSON chat line, None when the line carries no text
fn parse_chat_line(line: &str) -> Result<Option<String>> {
    let chunk: ChatResponse = serde_json::from_str(line)
        .map_err(|e| Error::generation(format!("Malformed stream line: {}", e)))?;
    if let Some(error) = chunk.error {
        return Err(Error::generation(error));
    }
    Ok(chunk
        .message
        .map(|m| m.content)
        .filter(|content| !content.is_empty()))
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = self.url("/api/embeddings");
        let request = EmbedRequest {
            model: &self.config.embed_model,
            prompt: text,
        };

        let (client, url, request) = (&self.client, &url, &request);
        retry_request(self.config.max_retries, || async move {
            let response = client
                .post(url)
                .json(request)
                .send()
                .await
                .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(Error::embedding(format!(
                    "Embedding failed: HTTP {}",
                    response.status()
                )));
            }

            let embed_response: EmbedResponse = response
                .json()
                .await
                .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

            Ok(embed_response.embedding)
        })
        .await
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        match self.client.get(self.url("/api/tags")).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[async_trait]
impl LlmProvider for OllamaClient {
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        tracing::info!("Generating with model: {}", self.config.generate_model);

        let response = self.send_chat(messages, temperature, false).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("Failed to parse chat response: {}", e)))?;

        if let Some(error) = body.error {
            return Err(Error::generation(error));
        }
        body.message
            .map(|m| m.content)
            .ok_or_else(|| Error::generation("Chat response carried no message"))
    }

    async fn complete_stream(&self, messages: &[ChatMessage], temperature: f32) -> Result<TextStream> {
        let response = self.send_chat(messages, temperature, true).await?;

        let stream = lines(response.bytes_stream().boxed())
            .try_filter_map(|line| async move { parse_chat_line(&line) });

        Ok(stream.boxed())
    }

    async fn health_check(&self) -> Result<bool> {
        EmbeddingProvider::health_check(self).await
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.config.generate_model
    }
}
