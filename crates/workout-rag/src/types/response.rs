//! Response bodies returned by the service

use serde::{Deserialize, Serialize};

use super::chat::TranscriptMessage;
use super::plan::WorkoutPlan;

/// A cited source (file and page)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub file_name: String,
    /// Page number or "unknown"
    pub page: String,
}

impl SourceRef {
    /// Format for display in text
    pub fn format_inline(&self) -> String {
        format!("[Source: {}, Page {}]", self.file_name, self.page)
    }
}

/// Answer to a filtered search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// Plan generation or adjustment result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanResponse {
    pub plan: WorkoutPlan,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanationResponse {
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssessmentResponse {
    /// HTML paragraphs
    pub assessment: String,
    pub name: String,
    pub bmi: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsResponse {
    pub insights: Vec<String>,
    /// Human-readable summary of the insight list
    pub summary: String,
}

/// Indexed documents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentListResponse {
    pub documents: Vec<String>,
}

/// Result of ingesting one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestResponse {
    pub file_name: String,
    pub chunks: usize,
    pub pages: usize,
}

/// Stored transcript of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistoryResponse {
    pub session_id: String,
    pub messages: Vec<TranscriptMessage>,
}

/// Kind of event pushed over the chat WebSocket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatEventType {
    SessionId,
    History,
    Answer,
    Error,
}

/// Event pushed over the chat WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEvent {
    pub event_type: ChatEventType,
    pub data: serde_json::Value,
}

impl ChatEvent {
    pub fn new(event_type: ChatEventType, data: impl Into<serde_json::Value>) -> Self {
        Self {
            event_type,
            data: data.into(),
        }
    }
}

/// Health check body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub llm_available: bool,
    pub documents_indexed: usize,
}
