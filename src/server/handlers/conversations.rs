use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value};

use crate::core::errors::ApiError;
use crate::server::extract::ApiPath;
use crate::state::AppState;

pub async fn list_conversations(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let conversations: Vec<Value> = state
        .conversations
        .list_conversations()
        .await
        .into_iter()
        .map(|c| {
            json!({
                "id": c.id,
                "title": c.title,
                "updated_at": c.updated_at
            })
        })
        .collect();
    Json(json!(conversations))
}

pub async fn get_conversation_messages(
    State(state): State<Arc<AppState>>,
    ApiPath(conversation_id): ApiPath<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let messages: Vec<Value> = state
        .conversations
        .messages(conversation_id)
        .await?
        .into_iter()
        .map(|m| {
            json!({
                "id": m.id,
                "content": m.content,
                "is_user": m.is_user,
                "timestamp": m.timestamp
            })
        })
        .collect();
    Ok(Json(json!(messages)))
}
