use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

const SERVICE_NAME: &str = "ai-chatbot-backend";

pub async fn root(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "message": state.settings.app.name,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "active"
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.settings.app.environment,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}
