// RAG Agent Node
// Drafts the first answer from the knowledge base

use async_trait::async_trait;

use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::WorkflowState;

use super::RAG_AGENT;

pub struct RagAgentNode;

impl RagAgentNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RagAgentNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for RagAgentNode {
    fn id(&self) -> &'static str {
        RAG_AGENT
    }

    fn name(&self) -> &'static str {
        "RAG Agent"
    }

    async fn execute(
        &self,
        state: &mut WorkflowState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        tracing::info!(history_turns = state.history.len(), "Generating draft answer");

        let draft = ctx
            .services
            .answer_generator()
            .generate(&state.question, &state.history)
            .await
            .map_err(|e| GraphError::from_api(self.id(), e))?;

        tracing::info!(chars = draft.len(), "Draft answer ready");
        state
            .set_draft(draft)
            .map_err(|e| GraphError::from_state(self.id(), e))?;
        state.bump_revision();

        Ok(NodeOutput::Continue)
    }
}
