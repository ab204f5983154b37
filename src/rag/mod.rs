//! Retrieval-augmented answer drafting.
//!
//! - `KnowledgeRetriever`: passage lookup against the managed search index
//! - `AzureSearchRetriever`: Azure Cognitive Search implementation
//! - `AnswerGenerator`: grounds one chat completion on retrieved passages

pub mod answer;
pub mod azure_search;
pub mod retriever;

pub use answer::AnswerGenerator;
pub use azure_search::AzureSearchRetriever;
pub use retriever::KnowledgeRetriever;
