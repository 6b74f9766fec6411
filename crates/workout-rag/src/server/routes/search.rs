//! Non-streaming question answering

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{SearchRequest, SearchResponse};

/// POST /api/search - Answer a question, optionally within one document
pub async fn filtered_search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>> {
    let response = state.chat().filtered_search(&request).await?;
    Ok(Json(response))
}
