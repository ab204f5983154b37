use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

const INTERNAL_DETAIL: &str = "An unexpected error occurred while processing the request.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// An external provider (completion, search index, reference lookup)
    /// failed, timed out or answered with something unusable.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn upstream<E: std::fmt::Display>(err: E) -> Self {
        ApiError::UpstreamUnavailable(err.to_string())
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, ApiError::UpstreamUnavailable(_))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, title, detail) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "Bad Request", msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "Not Found", msg.clone()),
            ApiError::UpstreamUnavailable(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Upstream Error",
                format!("An error occurred while contacting an external service: {}", msg),
            ),
            // The message can name nodes and traces; it goes to the log only.
            ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                INTERNAL_DETAIL.to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({ "error": title, "detail": detail }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphError;

    #[test]
    fn status_codes_follow_variant() {
        assert_eq!(
            ApiError::BadRequest("x".into()).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("x".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::upstream("timeout").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::internal("boom").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn internal_detail_hides_node_and_trace() {
        let err = GraphError::new(
            "prepare_final_response",
            "supervisor decision is not available yet",
        )
        .with_trace(vec!["call_rag_agent".into(), "call_supervisor_agent".into()]);
        let api: ApiError = err.into();

        let response = api.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = crate::testing::json_body(response).await;
        assert_eq!(body["error"], "Internal Server Error");
        assert_eq!(body["detail"], INTERNAL_DETAIL);
        let rendered = body.to_string();
        assert!(!rendered.contains("call_rag_agent"));
        assert!(!rendered.contains("prepare_final_response"));
    }

    #[tokio::test]
    async fn upstream_detail_names_the_failure() {
        let response = ApiError::upstream("503 from search").into_response();
        let body = crate::testing::json_body(response).await;
        assert_eq!(body["error"], "Upstream Error");
        assert!(body["detail"].as_str().unwrap().contains("503 from search"));
    }

    #[test]
    fn upstream_helper_marks_kind() {
        assert!(ApiError::upstream("503").is_upstream());
        assert!(!ApiError::internal("503").is_upstream());
    }
}
