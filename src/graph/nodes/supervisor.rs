// Supervisor Node
// Reviews the draft and picks the next step

use async_trait::async_trait;

use crate::core::errors::ApiError;
use crate::graph::decision::{decide, route_decision, SupervisorDecision};
use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::prompts::supervisor_prompt;
use crate::graph::state::WorkflowState;
use crate::llm::CompletionProvider;

use super::SUPERVISOR;

/// One completion call, then the tolerant parse. Only a failure of the
/// completion call itself is returned as an error.
pub async fn review_answer(
    completion: &dyn CompletionProvider,
    question: &str,
    draft: &str,
) -> Result<SupervisorDecision, ApiError> {
    let raw = completion
        .complete(&supervisor_prompt(question, draft))
        .await?;
    Ok(decide(&raw, draft))
}

pub struct SupervisorNode;

impl SupervisorNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SupervisorNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for SupervisorNode {
    fn id(&self) -> &'static str {
        SUPERVISOR
    }

    fn name(&self) -> &'static str {
        "Supervisor"
    }

    async fn execute(
        &self,
        state: &mut WorkflowState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let draft = state
            .require_draft()
            .map_err(|e| GraphError::from_state(self.id(), e))?
            .to_string();

        let decision = review_answer(ctx.services.completion.as_ref(), &state.question, &draft)
            .await
            .map_err(|e| GraphError::from_api(self.id(), e))?;

        let route = route_decision(&decision);
        tracing::info!(
            decision = decision.kind(),
            reasoning = decision.reasoning().unwrap_or(""),
            route = route.as_str(),
            "Supervisor decision"
        );

        state
            .set_decision(decision)
            .map_err(|e| GraphError::from_state(self.id(), e))?;

        Ok(NodeOutput::Branch(route.as_str().to_string()))
    }
}
