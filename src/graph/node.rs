// Node trait and types
// Base abstraction for workflow graph nodes

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::CompletionProvider;
use crate::rag::{AnswerGenerator, KnowledgeRetriever};
use crate::tools::ReferenceLookup;

use super::state::{StateError, WorkflowState};

/// Per-run tuning knobs taken from settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    pub retrieval_top_k: usize,
    pub reference_max_results: usize,
    pub reference_max_chars: usize,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            retrieval_top_k: 5,
            reference_max_results: 1,
            reference_max_chars: 2500,
        }
    }
}

/// External collaborators shared by every run. Built once at startup.
#[derive(Clone)]
pub struct WorkflowServices {
    pub completion: Arc<dyn CompletionProvider>,
    pub retriever: Arc<dyn KnowledgeRetriever>,
    pub reference: Arc<dyn ReferenceLookup>,
    pub options: WorkflowOptions,
}

impl WorkflowServices {
    pub fn answer_generator(&self) -> AnswerGenerator {
        AnswerGenerator::new(
            self.completion.clone(),
            self.retriever.clone(),
            self.options.retrieval_top_k,
        )
    }
}

/// Context passed to nodes during execution
pub struct NodeContext<'a> {
    pub services: &'a WorkflowServices,
}

/// Output from a node execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeOutput {
    /// Follow the node's unconditional edge
    Continue,
    /// Follow the outgoing edge labelled with this condition
    Branch(String),
    /// Graph execution complete
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// An external service call failed.
    Upstream,
    /// Wiring, state or routing defect inside the workflow.
    Internal,
}

/// Graph execution error
///
/// `execution_trace` records the node IDs visited before the failure,
/// most-recent last.
#[derive(Debug, Clone)]
pub struct GraphError {
    pub node_id: String,
    pub message: String,
    pub kind: FailureKind,
    pub execution_trace: Vec<String>,
}

impl GraphError {
    pub fn new(node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            message: message.into(),
            kind: FailureKind::Internal,
            execution_trace: Vec::new(),
        }
    }

    pub fn from_api(node_id: impl Into<String>, err: ApiError) -> Self {
        let (kind, message) = match err {
            ApiError::UpstreamUnavailable(msg) => (FailureKind::Upstream, msg),
            other => (FailureKind::Internal, other.to_string()),
        };
        Self {
            node_id: node_id.into(),
            message,
            kind,
            execution_trace: Vec::new(),
        }
    }

    pub fn from_state(node_id: impl Into<String>, err: StateError) -> Self {
        Self::new(node_id, err.to_string())
    }

    pub fn with_trace(mut self, trace: Vec<String>) -> Self {
        self.execution_trace = trace;
        self
    }

    pub fn is_upstream(&self) -> bool {
        self.kind == FailureKind::Upstream
    }
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        match err.kind {
            FailureKind::Upstream => ApiError::UpstreamUnavailable(err.message),
            FailureKind::Internal => ApiError::internal(&err),
        }
    }
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.execution_trace.is_empty() {
            write!(f, "GraphError in {}: {}", self.node_id, self.message)
        } else {
            write!(
                f,
                "GraphError in {} (trace: {}): {}",
                self.node_id,
                self.execution_trace.join(" -> "),
                self.message
            )
        }
    }
}

impl std::error::Error for GraphError {}

/// Node trait - all graph nodes implement this
#[async_trait]
pub trait Node: Send + Sync {
    /// Unique identifier for this node
    fn id(&self) -> &'static str;

    /// Human-readable name for display
    fn name(&self) -> &'static str {
        self.id()
    }

    /// Execute the node logic
    async fn execute(
        &self,
        state: &mut WorkflowState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError>;
}
