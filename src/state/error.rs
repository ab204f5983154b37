use thiserror::Error;

use crate::graph::GraphError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Failed to build workflow graph: {0}")]
    Graph(#[source] GraphError),
}
