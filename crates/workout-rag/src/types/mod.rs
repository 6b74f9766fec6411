//! Core types for the workout RAG service

pub mod chat;
pub mod document;
pub mod insight;
pub mod plan;
pub mod profile;
pub mod query;
pub mod response;

pub use chat::{ChatRole, TranscriptMessage, Turn};
pub use document::{source_identity, DocumentChunk, FileType, PageText};
pub use insight::ChatInsightSet;
pub use plan::{Weekday, WorkoutPlan};
pub use profile::{bmi_category, goal_description, TrainingEnvironment, UserProfile};
pub use query::{AdjustPlanRequest, ChatQuery, ExplainExerciseRequest, InsightsRequest, SearchRequest};
pub use response::{
    AssessmentResponse, ChatEvent, ChatEventType, ChatHistoryResponse, DocumentListResponse,
    ExplanationResponse, HealthResponse, IngestResponse, InsightsResponse, PlanResponse,
    SearchResponse, SourceRef,
};
