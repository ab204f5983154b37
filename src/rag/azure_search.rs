use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::retriever::KnowledgeRetriever;
use crate::core::config::settings::RetrievalSettings;
use crate::core::errors::ApiError;

#[derive(Clone)]
pub struct AzureSearchRetriever {
    service_name: String,
    index_name: String,
    api_version: String,
    api_key: String,
    content_key: String,
    client: Client,
}

impl AzureSearchRetriever {
    pub fn new(settings: &RetrievalSettings, client: Client) -> Self {
        Self {
            service_name: settings.service_name.clone(),
            index_name: settings.index_name.clone(),
            api_version: settings.api_version.clone(),
            api_key: settings.api_key.clone(),
            content_key: settings.content_key.clone(),
            client,
        }
    }

    fn search_url(&self) -> String {
        format!(
            "https://{}.search.windows.net/indexes/{}/docs/search?api-version={}",
            self.service_name,
            urlencoding::encode(&self.index_name),
            urlencoding::encode(&self.api_version)
        )
    }
}

#[async_trait]
impl KnowledgeRetriever for AzureSearchRetriever {
    fn name(&self) -> &str {
        "azure_cognitive_search"
    }

    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>, ApiError> {
        let body = json!({
            "search": query,
            "top": top_k,
            "select": self.content_key,
        });

        let res = self
            .client
            .post(self.search_url())
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApiError::upstream(format!("search request failed: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::UpstreamUnavailable(format!(
                "search service returned {}: {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|e| ApiError::upstream(format!("invalid search payload: {}", e)))?;

        let passages = extract_passages(&payload, &self.content_key, top_k);
        tracing::debug!(count = passages.len(), "Knowledge passages retrieved");
        Ok(passages)
    }
}

/// Reads `value[].{content_key}` in ranking order, skipping blank entries.
fn extract_passages(payload: &Value, content_key: &str, top_k: usize) -> Vec<String> {
    payload
        .get("value")
        .and_then(|v| v.as_array())
        .map(|docs| {
            docs.iter()
                .filter_map(|doc| doc.get(content_key).and_then(|c| c.as_str()))
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .take(top_k)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RetrievalSettings {
        RetrievalSettings {
            service_name: "kb-search".to_string(),
            api_key: "search-key".to_string(),
            index_name: "knowledge-base".to_string(),
            api_version: "2023-11-01".to_string(),
            content_key: "content".to_string(),
            top_k: 5,
        }
    }

    #[test]
    fn search_url_targets_index_docs_endpoint() {
        let retriever = AzureSearchRetriever::new(&settings(), Client::new());
        assert_eq!(
            retriever.search_url(),
            "https://kb-search.search.windows.net/indexes/knowledge-base/docs/search?api-version=2023-11-01"
        );
    }

    #[test]
    fn passages_keep_ranking_order() {
        let payload = json!({
            "value": [
                {"@search.score": 3.1, "content": "FIFO rotates older stock first."},
                {"@search.score": 2.4, "content": "  "},
                {"@search.score": 1.9, "content": "Safety stock buffers demand spikes."},
                {"@search.score": 1.2}
            ]
        });
        assert_eq!(
            extract_passages(&payload, "content", 5),
            vec![
                "FIFO rotates older stock first.".to_string(),
                "Safety stock buffers demand spikes.".to_string()
            ]
        );
    }

    #[test]
    fn passages_are_capped_at_top_k() {
        let payload = json!({
            "value": [{"content": "a"}, {"content": "b"}, {"content": "c"}]
        });
        assert_eq!(extract_passages(&payload, "content", 2).len(), 2);
    }

    #[test]
    fn custom_content_key_is_honoured() {
        let payload = json!({"value": [{"chunk": "cross-docking"}]});
        assert_eq!(extract_passages(&payload, "chunk", 5), vec!["cross-docking"]);
        assert!(extract_passages(&json!({}), "chunk", 5).is_empty());
    }
}
