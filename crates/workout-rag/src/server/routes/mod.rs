//! API routes for the workout RAG server

pub mod chat;
pub mod documents;
pub mod search;
pub mod workout;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all `/api` routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Document registry, with a larger body limit for uploads
        .route(
            "/documents",
            get(documents::list_documents)
                .post(documents::upload_document)
                .delete(documents::clear_documents)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route("/search", post(search::filtered_search))
        // Chat transcripts
        .route(
            "/chat/:session_id",
            get(chat::get_history).delete(chat::clear_history),
        )
        // Workout planning
        .route("/workout/plan", post(workout::generate_plan))
        .route("/workout/adjust", post(workout::adjust_plan))
        .route("/workout/explain", post(workout::explain_exercise))
        .route("/workout/assessment", post(workout::assess_physical))
        .route("/workout/insights", post(workout::analyze_insights))
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "workout-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Workout planning and document Q&A grounded in uploaded PDFs",
        "endpoints": {
            "GET /api/documents": "List indexed documents",
            "POST /api/documents": "Upload and index a document (multipart field 'file')",
            "DELETE /api/documents": "Remove every indexed document",
            "POST /api/search": "Answer a question, optionally within one document",
            "GET /ws/chat?session_id=": "Streaming chat over WebSocket",
            "GET /api/chat/:session_id": "Stored chat transcript",
            "DELETE /api/chat/:session_id": "Clear a chat transcript",
            "POST /api/workout/plan": "Generate a weekly plan",
            "POST /api/workout/adjust": "Adjust an existing plan",
            "POST /api/workout/explain": "Explain one exercise",
            "POST /api/workout/assessment": "Physical assessment",
            "POST /api/workout/insights": "Mine insights from pasted chat history"
        }
    }))
}
