//! OpenAI-compatible client for embeddings and chat completion

use async_trait::async_trait;
use futures::{future, StreamExt, TryStreamExt};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{ChatMessage, LlmProvider, TextStream};
use super::transport::{lines, retry_request};

/// Maximum inputs per `/embeddings` request
const MAX_BATCH_SIZE: usize = 100;

/// Client for any endpoint speaking the OpenAI REST dialect
pub struct OpenAiClient {
    client: Client,
    config: LlmConfig,
    dimensions: usize,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.config.base_url)
            .field("generate_model", &self.config.generate_model)
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<Delta>,
    #[serde(default)]
    delta: Option<Delta>,
}

#[derive(Deserialize)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig, dimensions: usize) -> Result<Self> {
        if config.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(Error::Config(
                "OpenAI-compatible backend requires llm.api_key".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config: config.clone(),
            dimensions,
        })
    }

    fn post(&self, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let builder = self.client.post(url);
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn batch_embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.config.embed_model,
            input: texts,
        };
        let request = &request;

        let data: EmbeddingResponse = retry_request(self.config.max_retries, || async move {
            let response = self
                .post("/embeddings")
                .json(request)
                .send()
                .await
                .map_err(|e| Error::embedding(format!("API request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(Error::embedding(format!(
                    "API returned error {}: {}",
                    status, error_text
                )));
            }

            response
                .json()
                .await
                .map_err(|e| Error::embedding(format!("Failed to parse response: {}", e)))
        })
        .await?;

        if data.data.len() != texts.len() {
            return Err(Error::embedding(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                data.data.len()
            )));
        }
        Ok(data.data.into_iter().map(|d| d.embedding).collect())
    }

    async fn send_completion(
        &self,
        messages: &[ChatMessage],
        temperature: f32,
        stream: bool,
    ) -> Result<reqwest::Response> {
        let request = CompletionRequest {
            model: &self.config.generate_model,
            messages,
            temperature,
            stream,
        };
        let request = &request;

        retry_request(self.config.max_retries, || async move {
            let response = self
                .post("/chat/completions")
                .json(request)
                .send()
                .await
                .map_err(|e| Error::generation(format!("Completion request failed: {}", e)))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::generation(format!(
                    "Completion failed: HTTP {} - {}",
                    status, body
                )));
            }
            Ok(response)
        })
        .await
    }
}

/// Text carried by one server-sent event line
fn parse_sse_line(line: &str) -> Result<Option<String>> {
    let Some(payload) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let payload = payload.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return Ok(None);
    }
    let chunk: CompletionResponse = serde_json::from_str(payload)
        .map_err(|e| Error::generation(format!("Malformed stream event: {}", e)))?;
    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta)
        .and_then(|d| d.content)
        .filter(|content| !content.is_empty()))
}

fn is_done_marker(line: &str) -> bool {
    line.strip_prefix("data:").map(str::trim) == Some("[DONE]")
}

#[async_trait]
impl EmbeddingProvider for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.batch_embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("Empty embedding response"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH_SIZE) {
            all_embeddings.extend(self.batch_embed(batch).await?);
        }
        Ok(all_embeddings)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        let mut request = self.client.get(url);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }
        match request.send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "openai"
    }
}

#[async_trait]
impl LlmProvider for OpenAiClient {
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String> {
        tracing::info!("Generating with model: {}", self.config.generate_model);

        let response = self.send_completion(messages, temperature, false).await?;
        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("Failed to parse completion: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .ok_or_else(|| Error::generation("Completion carried no content"))
    }

    async fn complete_stream(&self, messages: &[ChatMessage], temperature: f32) -> Result<TextStream> {
        let response = self.send_completion(messages, temperature, true).await?;

        let stream = lines(response.bytes_stream().boxed())
            .try_take_while(|line| future::ready(Ok(!is_done_marker(line))))
            .try_filter_map(|line| async move { parse_sse_line(&line) });

        Ok(stream.boxed())
    }

    async fn health_check(&self) -> Result<bool> {
        EmbeddingProvider::health_check(self).await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.config.generate_model
    }
}
