use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Read-only access to the managed knowledge index.
#[async_trait]
pub trait KnowledgeRetriever: Send + Sync {
    fn name(&self) -> &str;

    /// Returns up to `top_k` passages, most relevant first. An empty vector
    /// means the index had nothing for the query.
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>, ApiError>;
}
