use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::CompletionProvider;
use super::types::ChatRequest;
use crate::core::config::settings::LlmSettings;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct AzureOpenAiProvider {
    endpoint: String,
    deployment: String,
    api_version: String,
    api_key: String,
    default_temperature: f64,
    default_max_tokens: u32,
    client: Client,
}

impl AzureOpenAiProvider {
    pub fn new(settings: &LlmSettings, client: Client) -> Self {
        Self {
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            deployment: settings.deployment.clone(),
            api_version: settings.api_version.clone(),
            api_key: settings.api_key.clone(),
            default_temperature: settings.temperature,
            default_max_tokens: settings.max_tokens,
            client,
        }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint,
            urlencoding::encode(&self.deployment),
            urlencoding::encode(&self.api_version)
        )
    }

    fn request_body(&self, request: &ChatRequest) -> Value {
        json!({
            "messages": request.messages,
            "temperature": request.temperature.unwrap_or(self.default_temperature),
            "max_tokens": request.max_tokens.unwrap_or(self.default_max_tokens),
        })
    }
}

#[async_trait]
impl CompletionProvider for AzureOpenAiProvider {
    fn name(&self) -> &str {
        "azure_openai"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        let res = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.api_key)
            .json(&self.request_body(&request))
            .send()
            .await
            .map_err(|e| ApiError::upstream(format!("completion request failed: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::UpstreamUnavailable(format!(
                "completion service returned {}: {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ApiError::upstream(format!("invalid completion payload: {}", e)))?;

        let content = extract_message_content(&payload).ok_or_else(|| {
            ApiError::UpstreamUnavailable("completion payload has no message content".to_string())
        })?;

        tracing::debug!(
            provider = self.name(),
            chars = content.len(),
            "Completion received"
        );
        Ok(content)
    }
}

/// Pulls `choices[0].message.content` out of a chat completion payload.
pub(crate) fn extract_message_content(payload: &Value) -> Option<String> {
    payload
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}
