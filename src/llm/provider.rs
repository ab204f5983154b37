use async_trait::async_trait;

use super::types::{ChatMessage, ChatRequest};
use crate::core::errors::ApiError;

/// Text generation backend used by every step of the answer workflow.
///
/// Implementations return the assistant text verbatim. Transport failures,
/// non-success statuses and unusable payloads surface as
/// `ApiError::UpstreamUnavailable`.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// provider name used in logs (e.g. "azure_openai")
    fn name(&self) -> &str;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError>;

    /// single user prompt, no system message or history
    async fn complete(&self, prompt: &str) -> Result<String, ApiError> {
        self.chat(ChatRequest::new(vec![ChatMessage::user(prompt)]))
            .await
    }
}
