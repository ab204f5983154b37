// Enrich Node
// Merges the draft with reference context

use async_trait::async_trait;

use crate::graph::decision::SupervisorDecision;
use crate::graph::node::{GraphError, Node, NodeContext, NodeOutput};
use crate::graph::prompts::merge_prompt;
use crate::graph::state::{WorkflowPhase, WorkflowState};

use super::ENRICH;

pub struct EnrichNode;

impl EnrichNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EnrichNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for EnrichNode {
    fn id(&self) -> &'static str {
        ENRICH
    }

    fn name(&self) -> &'static str {
        "Enrich With Wikipedia"
    }

    async fn execute(
        &self,
        state: &mut WorkflowState,
        ctx: &NodeContext<'_>,
    ) -> Result<NodeOutput, GraphError> {
        let query = match state
            .require_decision()
            .map_err(|e| GraphError::from_state(self.id(), e))?
        {
            SupervisorDecision::ComplementWithWikipedia { search_query, .. } => {
                search_query.clone()
            }
            other => {
                return Err(GraphError::new(
                    self.id(),
                    format!("{} decision does not request enrichment", other.kind()),
                ))
            }
        };
        let draft = state
            .require_draft()
            .map_err(|e| GraphError::from_state(self.id(), e))?
            .to_string();

        state
            .advance(WorkflowPhase::Enriching)
            .map_err(|e| GraphError::from_state(self.id(), e))?;

        let options = ctx.services.options;
        let reference = match ctx
            .services
            .reference
            .lookup(
                &query,
                options.reference_max_results,
                options.reference_max_chars,
            )
            .await
        {
            Ok(text) if !text.trim().is_empty() => {
                tracing::info!(query = %query, chars = text.chars().count(), "Reference context found");
                text
            }
            Ok(_) => {
                tracing::warn!(query = %query, "Reference lookup returned nothing, merging without context");
                String::new()
            }
            Err(err) => {
                tracing::warn!(query = %query, error = %err, "Reference lookup failed, merging without context");
                String::new()
            }
        };

        let merged = ctx
            .services
            .completion
            .complete(&merge_prompt(&draft, &reference))
            .await
            .map_err(|e| GraphError::from_api(self.id(), e))?;

        let answer = match merged.trim() {
            "" => {
                tracing::warn!("Merge produced no text, keeping draft answer");
                draft
            }
            text => text.to_string(),
        };

        state.bump_revision();
        state
            .set_final_answer(answer)
            .map_err(|e| GraphError::from_state(self.id(), e))?;

        Ok(NodeOutput::Final)
    }
}
