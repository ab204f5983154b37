// Finalize Node
// Copies the terminal decision text into the final answer

use async_trait::async_trait;

use crate::graph::decision::{finalize_text, SupervisorDecision};
use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::state::{WorkflowPhase, WorkflowState};

use super::FINALIZE;

pub struct FinalizeNode;

impl FinalizeNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FinalizeNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for FinalizeNode {
    fn id(&self) -> &'static str {
        FINALIZE
    }

    fn name(&self) -> &'static str {
        "Finalize"
    }

    async fn execute(
        &self,
        state: &mut WorkflowState,
        _ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let decision = state
            .require_decision()
            .map_err(|e| GraphError::from_state(self.id(), e))?
            .clone();

        let text = finalize_text(&decision).ok_or_else(|| {
            GraphError::new(
                self.id(),
                format!("{} decision cannot be finalized directly", decision.kind()),
            )
        })?;

        if let Some(reasoning) = decision.reasoning() {
            tracing::info!(reasoning, "Applying supervisor correction");
        }

        state
            .advance(WorkflowPhase::Finalizing)
            .map_err(|e| GraphError::from_state(self.id(), e))?;
        if matches!(decision, SupervisorDecision::CorrectAndRefine { .. }) {
            state.bump_revision();
        }
        state
            .set_final_answer(text.to_string())
            .map_err(|e| GraphError::from_state(self.id(), e))?;

        Ok(NodeOutput::Final)
    }
}
