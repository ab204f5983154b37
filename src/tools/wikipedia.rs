use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::reference::ReferenceLookup;
use crate::core::errors::ApiError;

const USER_AGENT: &str = concat!("ingenierin-backend/", env!("CARGO_PKG_VERSION"));

/// MediaWiki-backed reference lookup: title search, then plain-text intros.
#[derive(Clone)]
pub struct WikipediaLookup {
    api_url: String,
    client: Client,
}

impl WikipediaLookup {
    pub fn new(language: &str, client: Client) -> Self {
        Self {
            api_url: format!("https://{}.wikipedia.org/w/api.php", language.trim()),
            client,
        }
    }

    async fn get_json(&self, url: String) -> Result<Value, ApiError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| ApiError::upstream(format!("wikipedia request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(ApiError::UpstreamUnavailable(format!(
                "wikipedia returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::upstream(format!("invalid wikipedia payload: {}", e)))
    }

    async fn search_titles(&self, query: &str, limit: usize) -> Result<Vec<String>, ApiError> {
        let url = format!(
            "{}?action=query&list=search&format=json&srsearch={}&srlimit={}",
            self.api_url,
            urlencoding::encode(query),
            limit
        );
        let payload = self.get_json(url).await?;
        Ok(parse_search_titles(&payload))
    }

    async fn page_extract(&self, title: &str) -> Result<Option<(String, String)>, ApiError> {
        let url = format!(
            "{}?action=query&prop=extracts&exintro=1&explaintext=1&redirects=1&format=json&titles={}",
            self.api_url,
            urlencoding::encode(title)
        );
        let payload = self.get_json(url).await?;
        Ok(parse_page_extract(&payload))
    }
}

#[async_trait]
impl ReferenceLookup for WikipediaLookup {
    fn name(&self) -> &str {
        "wikipedia"
    }

    async fn lookup(
        &self,
        query: &str,
        max_results: usize,
        max_chars: usize,
    ) -> Result<String, ApiError> {
        let query = query.trim();
        if query.is_empty() || max_results == 0 {
            return Ok(String::new());
        }

        let titles = self.search_titles(query, max_results).await?;
        let mut documents = Vec::with_capacity(titles.len());
        for title in titles.iter().take(max_results) {
            match self.page_extract(title).await? {
                Some(page) => documents.push(page),
                None => tracing::debug!(title = %title, "Wikipedia page had no extract"),
            }
        }

        Ok(format_documents(&documents, max_chars))
    }
}

fn parse_search_titles(payload: &Value) -> Vec<String> {
    payload
        .get("query")
        .and_then(|q| q.get("search"))
        .and_then(|s| s.as_array())
        .map(|hits| {
            hits.iter()
                .filter_map(|hit| hit.get("title").and_then(|t| t.as_str()))
                .filter(|t| !t.trim().is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// First page in `query.pages` that carries a non-empty extract.
fn parse_page_extract(payload: &Value) -> Option<(String, String)> {
    let pages = payload.get("query")?.get("pages")?.as_object()?;
    pages.values().find_map(|page| {
        if page.get("missing").is_some() {
            return None;
        }
        let title = page.get("title")?.as_str()?;
        let extract = page.get("extract")?.as_str()?.trim();
        if extract.is_empty() {
            None
        } else {
            Some((title.to_string(), extract.to_string()))
        }
    })
}

fn format_documents(documents: &[(String, String)], max_chars: usize) -> String {
    let joined = documents
        .iter()
        .map(|(title, extract)| format!("Page: {}\nSummary: {}", title, extract))
        .collect::<Vec<_>>()
        .join("\n\n");
    truncate_chars(&joined, max_chars)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}
