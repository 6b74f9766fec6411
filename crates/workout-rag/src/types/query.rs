//! Request bodies accepted by the service

use serde::{Deserialize, Serialize};

use super::plan::WorkoutPlan;
use super::profile::UserProfile;

/// Non-streaming question restricted to an optional document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// The question to answer
    pub query: String,
    /// Basename of the document to search in (None = whole index)
    #[serde(default)]
    pub document_name: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            document_name: None,
        }
    }

    /// Restrict the search to one document
    pub fn in_document(mut self, name: impl Into<String>) -> Self {
        self.document_name = Some(name.into());
        self
    }
}

/// Plan adjustment input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustPlanRequest {
    pub current_plan: WorkoutPlan,
    /// Free-text instruction such as "add one rest day"
    pub adjustment: String,
    pub name: String,
}

/// Exercise explanation input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainExerciseRequest {
    pub plan: WorkoutPlan,
    pub day: String,
    pub exercise: String,
    pub profile: UserProfile,
}

/// Raw text to mine for insights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsRequest {
    pub text: String,
}

/// Message sent by a WebSocket chat client
///
/// Clients may also send a bare text frame, which is treated as the question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatQuery {
    pub question: String,
}

impl ChatQuery {
    /// Accept either `{"question": "..."}` or plain text
    pub fn from_frame(frame: &str) -> Option<Self> {
        let question = match serde_json::from_str::<ChatQuery>(frame) {
            Ok(query) => query.question,
            Err(_) => frame.to_string(),
        };
        let question = question.trim();
        if question.is_empty() {
            None
        } else {
            Some(Self {
                question: question.to_string(),
            })
        }
    }
}
