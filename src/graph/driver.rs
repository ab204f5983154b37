use tracing::Instrument;

use super::node::{NodeContext, WorkflowServices};
use super::runtime::GraphRuntime;
use super::state::WorkflowState;
use crate::core::errors::ApiError;
use crate::llm::ChatMessage;

/// Result of one completed run.
#[derive(Debug, Clone)]
pub struct WorkflowOutcome {
    pub run_id: String,
    pub answer: String,
    pub revision_count: u32,
    pub path: Vec<String>,
}

/// Runs the workflow for one question. Upstream failures come back as
/// `ApiError::UpstreamUnavailable`; everything else that stops the run is
/// `ApiError::Internal`.
pub async fn process_user_question(
    runtime: &GraphRuntime,
    services: &WorkflowServices,
    question: &str,
    history: Vec<ChatMessage>,
) -> Result<WorkflowOutcome, ApiError> {
    let mut state = WorkflowState::new(question, history);
    let span = tracing::info_span!("workflow", run_id = %state.run_id);

    async move {
        tracing::info!("Workflow started");
        let ctx = NodeContext { services };
        let path = runtime.run(&mut state, &ctx).await.map_err(|err| {
            tracing::error!(error = %err, "Workflow failed");
            ApiError::from(err)
        })?;

        let answer = state
            .final_answer()
            .ok_or_else(|| ApiError::Internal("workflow ended without a final answer".to_string()))?
            .to_string();

        tracing::info!(
            path = %path.join(" -> "),
            revisions = state.revision_count(),
            "Workflow finished"
        );

        Ok(WorkflowOutcome {
            run_id: state.run_id.clone(),
            answer,
            revision_count: state.revision_count(),
            path,
        })
    }
    .instrument(span)
    .await
}
