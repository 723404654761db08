use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use super::AppState;
use crate::{
    assistant::{build_system_prompt, ChatBackend, ChatMessage},
    error::AppError,
};

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct Transcript {
    pub id: String,
    pub messages: Vec<ChatMessage>,
    /// True when the last user message has no answer yet and can be retried
    pub pending: bool,
}

#[derive(Debug, Deserialize)]
pub struct SendMessage {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct Reply {
    pub reply: String,
    pub turns: usize,
}

/// POST /api/chat/sessions
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionCreated>), AppError> {
    assistant(&state)?;
    let id = state.sessions.create();

    Ok((
        StatusCode::CREATED,
        Json(SessionCreated { id: id.to_string() }),
    ))
}

/// GET /api/chat/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Transcript>, AppError> {
    let conversation = state.sessions.get(&id)?;
    let conversation = conversation.lock().await;

    Ok(Json(Transcript {
        id,
        messages: conversation.messages().to_vec(),
        pending: conversation.has_pending_turn(),
    }))
}

/// POST /api/chat/sessions/:id/messages
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<SendMessage>,
) -> Result<Json<Reply>, AppError> {
    let start = Instant::now();
    let backend = assistant(&state)?;
    let conversation = state.sessions.get(&id)?;
    let system_prompt = system_prompt(&state).await?;

    let mut conversation = conversation.lock().await;
    let reply = conversation
        .ask(backend.as_ref(), &system_prompt, &body.content)
        .await?;

    tracing::info!(
        session_id = %id,
        turns = conversation.messages().len(),
        duration_ms = start.elapsed().as_millis(),
        "Answered chat message"
    );

    Ok(Json(Reply {
        reply,
        turns: conversation.messages().len(),
    }))
}

/// POST /api/chat/sessions/:id/retry
pub async fn retry_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Reply>, AppError> {
    let backend = assistant(&state)?;
    let conversation = state.sessions.get(&id)?;
    let system_prompt = system_prompt(&state).await?;

    let mut conversation = conversation.lock().await;
    let reply = conversation.retry(backend.as_ref(), &system_prompt).await?;

    tracing::info!(session_id = %id, "Retried chat message");

    Ok(Json(Reply {
        reply,
        turns: conversation.messages().len(),
    }))
}

/// POST /api/chat/sessions/:id/reset
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let conversation = state.sessions.get(&id)?;
    conversation.lock().await.reset();

    tracing::debug!(session_id = %id, "Chat session reset");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/chat/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(&id)?;

    tracing::debug!(session_id = %id, "Chat session deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn assistant(state: &AppState) -> Result<Arc<dyn ChatBackend>, AppError> {
    state
        .services
        .load()
        .assistant
        .clone()
        .ok_or_else(|| AppError::BadRequest("The quote assistant is disabled".to_string()))
}

async fn system_prompt(state: &AppState) -> Result<String, AppError> {
    let tables = state.tables().await?;
    let config = state.config.load();

    Ok(build_system_prompt(
        &tables,
        &config.columns,
        config.assistant.prompt_variant,
    ))
}
