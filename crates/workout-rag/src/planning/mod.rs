//! Structured workout planning on top of retrieval and generation

mod insights;
mod pipeline;

pub use insights::{extract_insights, EXERCISE_KEYWORDS, IMPORT_MARKER};
pub use pipeline::{PlanPipeline, ASSESSMENT_FALLBACK, EXPLANATION_FALLBACK};
