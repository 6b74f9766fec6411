//! WebSocket chat and transcript endpoints

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::chat::{format_sources_block, AnswerEvent};
use crate::error::Result;
use crate::server::state::AppState;
use crate::storage::run_blocking;
use crate::types::{ChatEvent, ChatEventType, ChatHistoryResponse, ChatQuery};

#[derive(Debug, Deserialize)]
pub struct ChatParams {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// GET /ws/chat?session_id= - Streaming chat
pub async fn chat_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<ChatParams>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.session_id))
}

async fn handle_socket(mut socket: WebSocket, state: AppState, session_id: Option<String>) {
    let session_id = match session_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => {
            if send_history(&mut socket, &state, &id).await.is_err() {
                return;
            }
            id
        }
        None => {
            let id = Uuid::new_v4().to_string();
            tracing::info!("New chat session {}", id);
            let event = ChatEvent::new(ChatEventType::SessionId, id.clone());
            if send_event(&mut socket, &event).await.is_err() {
                return;
            }
            id
        }
    };

    while let Some(message) = socket.recv().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => continue,
        };
        let Some(query) = ChatQuery::from_frame(&text) else {
            continue;
        };

        let mut answer = match state.chat().answer_query(&session_id, &query.question) {
            Ok(answer) => answer,
            Err(e) => {
                let event = ChatEvent::new(ChatEventType::Error, e.to_string());
                if send_event(&mut socket, &event).await.is_err() {
                    break;
                }
                continue;
            }
        };

        while let Some(event) = answer.next().await {
            let event = match event {
                AnswerEvent::Fragment(fragment) => ChatEvent::new(ChatEventType::Answer, fragment),
                AnswerEvent::Sources(sources) if sources.is_empty() => continue,
                AnswerEvent::Sources(sources) => {
                    ChatEvent::new(ChatEventType::Answer, format_sources_block(&sources))
                }
                AnswerEvent::Done => break,
                AnswerEvent::Error(message) => ChatEvent::new(ChatEventType::Error, message),
            };
            // Dropping `answer` on disconnect stops generation
            if send_event(&mut socket, &event).await.is_err() {
                tracing::info!("Chat session {} disconnected mid-answer", session_id);
                return;
            }
        }
    }

    tracing::info!("Chat session {} closed", session_id);
}

/// Replay a session's stored transcript; an empty transcript resets its memory
async fn send_history(socket: &mut WebSocket, state: &AppState, session_id: &str) -> std::result::Result<(), axum::Error> {
    let session = session_id.to_string();
    let loaded = run_blocking(Arc::clone(state.transcripts()), move |store| store.history(&session)).await;
    let history = match loaded {
        Ok(history) => history,
        Err(e) => {
            tracing::error!("Failed to load history for {}: {}", session_id, e);
            Vec::new()
        }
    };
    if history.is_empty() {
        state.chat().memory().reset(session_id);
    }

    let messages: Vec<serde_json::Value> = history
        .iter()
        .map(|m| json!({"role": m.role.as_str(), "message": m.message}))
        .collect();
    send_event(socket, &ChatEvent::new(ChatEventType::History, messages)).await
}

async fn send_event(socket: &mut WebSocket, event: &ChatEvent) -> std::result::Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(payload) => socket.send(Message::Text(payload)).await,
        Err(e) => {
            tracing::warn!("Failed to serialize chat event: {}", e);
            Ok(())
        }
    }
}

/// GET /api/chat/:session_id - Stored transcript
pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ChatHistoryResponse>> {
    let session = session_id.clone();
    let messages =
        run_blocking(Arc::clone(state.transcripts()), move |store| store.history(&session)).await?;
    Ok(Json(ChatHistoryResponse {
        session_id,
        messages,
    }))
}

/// DELETE /api/chat/:session_id - Clear transcript and session memory
pub async fn clear_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let removed = state.chat().clear_session(&session_id).await?;
    Ok(Json(json!({
        "message": "Chat history cleared successfully",
        "messages_removed": removed,
    })))
}
