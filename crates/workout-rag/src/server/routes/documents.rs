//! Document registry endpoints

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::json;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{DocumentListResponse, IngestResponse};

/// GET /api/documents - List indexed documents
pub async fn list_documents(State(state): State<AppState>) -> Result<Json<DocumentListResponse>> {
    let documents = state.ingest().list_documents().await?;
    Ok(Json(DocumentListResponse { documents }))
}

/// POST /api/documents - Upload and index one file (multipart field `file`)
pub async fn upload_document(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::validation("Uploaded file has no name"))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| Error::validation(format!("Failed to read file: {}", e)))?;

        tracing::info!("Received upload: {} ({} bytes)", filename, data.len());
        let report = state.ingest().ingest_document(&filename, data.to_vec()).await?;

        return Ok(Json(IngestResponse {
            file_name: report.source_file_path,
            chunks: report.chunks,
            pages: report.pages,
        }));
    }

    Err(Error::validation("No file uploaded"))
}

/// DELETE /api/documents - Remove every document from the index
pub async fn clear_documents(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let removed = state.ingest().clear_documents().await?;
    Ok(Json(json!({
        "message": "All documents deleted successfully",
        "chunks_removed": removed,
    })))
}
