// Workflow state
// Per-run record threaded through every node

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::decision::SupervisorDecision;
use crate::llm::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    Start,
    DraftGenerated,
    Decided,
    Enriching,
    Finalizing,
    Done,
}

impl WorkflowPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowPhase::Start => "start",
            WorkflowPhase::DraftGenerated => "draft_generated",
            WorkflowPhase::Decided => "decided",
            WorkflowPhase::Enriching => "enriching",
            WorkflowPhase::Finalizing => "finalizing",
            WorkflowPhase::Done => "done",
        }
    }

    pub fn can_transition_to(self, next: WorkflowPhase) -> bool {
        use WorkflowPhase::*;
        matches!(
            (self, next),
            (Start, DraftGenerated)
                | (DraftGenerated, Decided)
                | (Decided, Enriching)
                | (Decided, Finalizing)
                | (Enriching, Done)
                | (Finalizing, Done)
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("{0} has already been set for this run")]
    AlreadySet(&'static str),
    #[error("invalid phase transition {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error("{0} is not available yet")]
    Missing(&'static str),
}

/// State of one question's trip through the workflow. Built per request and
/// dropped once the answer is returned.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub run_id: String,
    pub question: String,
    pub history: Vec<ChatMessage>,
    draft: Option<String>,
    decision: Option<SupervisorDecision>,
    final_answer: Option<String>,
    revision_count: u32,
    phase: WorkflowPhase,
}

impl WorkflowState {
    pub fn new(question: impl Into<String>, history: Vec<ChatMessage>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            question: question.into(),
            history,
            draft: None,
            decision: None,
            final_answer: None,
            revision_count: 0,
            phase: WorkflowPhase::Start,
        }
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn revision_count(&self) -> u32 {
        self.revision_count
    }

    pub fn draft(&self) -> Option<&str> {
        self.draft.as_deref()
    }

    pub fn decision(&self) -> Option<&SupervisorDecision> {
        self.decision.as_ref()
    }

    pub fn final_answer(&self) -> Option<&str> {
        self.final_answer.as_deref()
    }

    pub fn require_draft(&self) -> Result<&str, StateError> {
        self.draft().ok_or(StateError::Missing("draft answer"))
    }

    pub fn require_decision(&self) -> Result<&SupervisorDecision, StateError> {
        self.decision().ok_or(StateError::Missing("supervisor decision"))
    }

    pub fn bump_revision(&mut self) {
        self.revision_count += 1;
    }

    pub fn advance(&mut self, next: WorkflowPhase) -> Result<(), StateError> {
        self.check_transition(next)?;
        self.phase = next;
        Ok(())
    }

    pub fn set_draft(&mut self, draft: String) -> Result<(), StateError> {
        ensure_unset(&self.draft, "draft answer")?;
        self.advance(WorkflowPhase::DraftGenerated)?;
        self.draft = Some(draft);
        Ok(())
    }

    pub fn set_decision(&mut self, decision: SupervisorDecision) -> Result<(), StateError> {
        ensure_unset(&self.decision, "supervisor decision")?;
        self.advance(WorkflowPhase::Decided)?;
        self.decision = Some(decision);
        Ok(())
    }

    /// Records the answer and closes the run. The caller must already be in
    /// `Enriching` or `Finalizing`.
    pub fn set_final_answer(&mut self, answer: String) -> Result<(), StateError> {
        ensure_unset(&self.final_answer, "final answer")?;
        self.advance(WorkflowPhase::Done)?;
        self.final_answer = Some(answer);
        Ok(())
    }

    fn check_transition(&self, next: WorkflowPhase) -> Result<(), StateError> {
        if self.phase.can_transition_to(next) {
            Ok(())
        } else {
            Err(StateError::InvalidTransition {
                from: self.phase.as_str(),
                to: next.as_str(),
            })
        }
    }
}

fn ensure_unset<T>(slot: &Option<T>, label: &'static str) -> Result<(), StateError> {
    if slot.is_some() {
        return Err(StateError::AlreadySet(label));
    }
    Ok(())
}
