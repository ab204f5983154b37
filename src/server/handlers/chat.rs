use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;
use crate::graph::process_user_question;
use crate::server::extract::ApiJson;
use crate::state::AppState;

const MAX_MESSAGE_CHARS: usize = 10_000;

#[derive(Debug, Deserialize)]
pub struct ChatMessageRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessageResponse {
    pub response: String,
    pub conversation_id: u64,
    /// Id of the stored assistant message.
    pub message_id: u64,
    pub timestamp: DateTime<Utc>,
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    ApiJson(payload): ApiJson<ChatMessageRequest>,
) -> Result<Json<ChatMessageResponse>, ApiError> {
    let message = validate_message(&payload.message)?;

    let conversation = match payload.conversation_id {
        Some(id) => state
            .conversations
            .get_conversation(id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("conversation {} not found", id)))?,
        None => state.conversations.create_conversation(message).await,
    };

    let history = state
        .conversations
        .recent_history(conversation.id, state.settings.conversation.history_limit)
        .await?;
    state
        .conversations
        .add_message(conversation.id, message, true)
        .await?;

    let outcome =
        process_user_question(&state.graph_runtime, &state.services, message, history).await?;

    let stored = state
        .conversations
        .add_message(conversation.id, &outcome.answer, false)
        .await?;

    Ok(Json(ChatMessageResponse {
        response: outcome.answer,
        conversation_id: conversation.id,
        message_id: stored.id,
        timestamp: stored.timestamp,
    }))
}

fn validate_message(raw: &str) -> Result<&str, ApiError> {
    let message = raw.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(ApiError::BadRequest(format!(
            "message must be at most {} characters",
            MAX_MESSAGE_CHARS
        )));
    }
    Ok(message)
}
