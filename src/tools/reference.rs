use async_trait::async_trait;

use crate::core::errors::ApiError;

/// Encyclopedic lookup used to complement a draft answer.
#[async_trait]
pub trait ReferenceLookup: Send + Sync {
    fn name(&self) -> &str;

    /// Formatted reference text for `query`, at most `max_chars` characters
    /// drawn from up to `max_results` documents. Empty when nothing matched.
    async fn lookup(
        &self,
        query: &str,
        max_results: usize,
        max_chars: usize,
    ) -> Result<String, ApiError>;
}
