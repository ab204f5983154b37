use std::sync::Arc;

use super::builder::build_workflow_graph;
use super::decision::SupervisorDecision;
use super::driver::process_user_question;
use super::node::{Node, NodeContext, WorkflowServices};
use super::nodes::{EnrichNode, FinalizeNode, ENRICH, FINALIZE, RAG_AGENT, SUPERVISOR};
use super::runtime::EdgeCondition;
use super::state::WorkflowState;
use crate::core::errors::ApiError;
use crate::llm::ChatMessage;
use crate::testing::{services_with, ScriptedCompletion, StaticReference, StaticRetriever};

const QUESTION: &str = "What is EOQ?";
const DRAFT: &str = "EOQ balances ordering and holding cost.";

struct Harness {
    completion: Arc<ScriptedCompletion>,
    retriever: Arc<StaticRetriever>,
    reference: Arc<StaticReference>,
    services: WorkflowServices,
}

impl Harness {
    fn new(replies: Vec<Result<String, String>>) -> Self {
        Self::with_reference(replies, StaticReference::new(""))
    }

    fn with_reference(replies: Vec<Result<String, String>>, reference: StaticReference) -> Self {
        let completion = Arc::new(ScriptedCompletion::new(replies));
        let retriever = Arc::new(StaticRetriever::new(&[
            "EOQ = sqrt(2DS/H) minimizes ordering plus holding cost.",
        ]));
        let reference = Arc::new(reference);
        let services = services_with(completion.clone(), retriever.clone(), reference.clone());
        Self {
            completion,
            retriever,
            reference,
            services,
        }
    }

    async fn run(&self) -> Result<super::WorkflowOutcome, ApiError> {
        let runtime = build_workflow_graph().unwrap();
        process_user_question(&runtime, &self.services, QUESTION, Vec::new()).await
    }
}

fn ok(text: &str) -> Result<String, String> {
    Ok(text.to_string())
}

#[tokio::test]
async fn final_answer_is_returned_verbatim() {
    let harness = Harness::new(vec![
        ok(DRAFT),
        ok(r#"{"type":"FinalAnswer","data":{"answer":"EOQ balances ordering and holding cost."}}"#),
    ]);

    let outcome = harness.run().await.unwrap();

    assert_eq!(outcome.answer, DRAFT);
    assert_eq!(outcome.path, vec![RAG_AGENT, SUPERVISOR, FINALIZE]);
    assert_eq!(outcome.revision_count, 1);
    assert_eq!(harness.completion.call_count(), 2);
    assert!(harness.reference.calls().is_empty());
    assert_eq!(harness.retriever.queries(), vec![(QUESTION.to_string(), 5)]);
}

#[tokio::test]
async fn fenced_correction_is_unwrapped_and_applied() {
    let harness = Harness::new(vec![
        ok(DRAFT),
        ok("```json\n{\"type\":\"CorrectAndRefine\",\"data\":{\"reasoning\":\"too terse\",\"corrected_answer\":\"EOQ is a formula that minimizes total inventory cost.\"}}\n```"),
    ]);

    let outcome = harness.run().await.unwrap();

    assert_eq!(
        outcome.answer,
        "EOQ is a formula that minimizes total inventory cost."
    );
    assert!(!outcome.answer.contains("too terse"));
    assert_eq!(outcome.revision_count, 2);
}

#[tokio::test]
async fn complement_merges_reference_text() {
    let merged = "EOQ balances ordering and holding cost. Just-in-time reduces inventory by ordering as needed.";
    let harness = Harness::with_reference(
        vec![
            ok(DRAFT),
            ok(r#"{"type":"ComplementWithWikipedia","data":{"reasoning":"add JIT background","search_query":"Just-in-time manufacturing"}}"#),
            ok(merged),
        ],
        StaticReference::new("JIT reduces inventory..."),
    );

    let outcome = harness.run().await.unwrap();

    assert_eq!(outcome.answer, merged);
    assert!(!outcome.answer.contains("add JIT background"));
    assert_eq!(outcome.path, vec![RAG_AGENT, SUPERVISOR, ENRICH]);
    assert_eq!(outcome.revision_count, 2);
    assert_eq!(
        harness.reference.calls(),
        vec![("Just-in-time manufacturing".to_string(), 1, 2500)]
    );

    let prompts = harness.completion.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[2].contains(DRAFT));
    assert!(prompts[2].contains("JIT reduces inventory..."));
}

#[tokio::test]
async fn unparseable_review_still_completes_with_draft() {
    let harness = Harness::new(vec![ok(DRAFT), ok("not json")]);

    let outcome = harness.run().await.unwrap();

    assert!(outcome.answer.contains(DRAFT));
    assert!(outcome.answer.contains("valid JSON"));
    assert_eq!(outcome.path.last().map(String::as_str), Some(FINALIZE));
}

#[tokio::test]
async fn malformed_decisions_never_fail_the_run() {
    for raw in [
        r#"{"type":"Escalate","data":{"answer":"x"}}"#,
        r#"{"type":"CorrectAndRefine","data":{"reasoning":"only reasoning"}}"#,
        r#"{"type":"ComplementWithWikipedia","data":{}}"#,
        "```json\n{broken\n```",
    ] {
        let harness = Harness::new(vec![ok(DRAFT), ok(raw)]);
        let outcome = harness.run().await.unwrap();
        assert!(outcome.answer.contains(DRAFT), "{raw}");
        assert!(harness.reference.calls().is_empty(), "{raw}");
    }
}

#[tokio::test]
async fn empty_final_answer_is_returned_as_given() {
    let harness = Harness::new(vec![
        ok(DRAFT),
        ok(r#"{"type":"FinalAnswer","data":{"answer":""}}"#),
    ]);

    let outcome = harness.run().await.unwrap();

    assert_eq!(outcome.answer, "");
    assert_eq!(outcome.path, vec![RAG_AGENT, SUPERVISOR, FINALIZE]);
}

#[tokio::test]
async fn draft_failure_propagates_as_upstream() {
    let harness = Harness::new(vec![Err("429 Too Many Requests".to_string())]);

    let err = harness.run().await.unwrap_err();

    assert!(matches!(err, ApiError::UpstreamUnavailable(ref m) if m.contains("429")));
    assert_eq!(harness.completion.call_count(), 1);
}

#[tokio::test]
async fn retrieval_failure_stops_before_any_completion() {
    let completion = Arc::new(ScriptedCompletion::replies(&[DRAFT]));
    let services = services_with(
        completion.clone(),
        Arc::new(StaticRetriever::failing()),
        Arc::new(StaticReference::new("")),
    );
    let runtime = build_workflow_graph().unwrap();

    let err = process_user_question(&runtime, &services, QUESTION, Vec::new())
        .await
        .unwrap_err();

    assert!(err.is_upstream());
    assert_eq!(completion.call_count(), 0);
}

#[tokio::test]
async fn supervisor_call_failure_propagates() {
    let harness = Harness::new(vec![ok(DRAFT), Err("connection reset".to_string())]);
    assert!(harness.run().await.unwrap_err().is_upstream());
}

#[tokio::test]
async fn merge_failure_propagates() {
    let harness = Harness::with_reference(
        vec![
            ok(DRAFT),
            ok(r#"{"type":"ComplementWithWikipedia","data":{"reasoning":"r","search_query":"EOQ"}}"#),
            Err("timeout".to_string()),
        ],
        StaticReference::new("Economic order quantity..."),
    );
    assert!(harness.run().await.unwrap_err().is_upstream());
}

#[tokio::test]
async fn failed_or_empty_lookup_merges_with_empty_context() {
    for reference in [StaticReference::failing(), StaticReference::new("")] {
        let harness = Harness::with_reference(
            vec![
                ok(DRAFT),
                ok(r#"{"type":"ComplementWithWikipedia","data":{"reasoning":"r","search_query":"Obscure topic"}}"#),
                ok("Merged without extra context."),
            ],
            reference,
        );

        let outcome = harness.run().await.unwrap();

        assert_eq!(outcome.answer, "Merged without extra context.");
        let prompts = harness.completion.prompts();
        assert!(prompts[2].contains("Wikipedia context: \"\""));
    }
}

#[tokio::test]
async fn blank_merge_keeps_draft() {
    let harness = Harness::with_reference(
        vec![
            ok(DRAFT),
            ok(r#"{"type":"ComplementWithWikipedia","data":{"reasoning":"r","search_query":"EOQ"}}"#),
            ok("   "),
        ],
        StaticReference::new("Economic order quantity..."),
    );
    assert_eq!(harness.run().await.unwrap().answer, DRAFT);
}

#[tokio::test]
async fn history_reaches_the_draft_request() {
    let completion = Arc::new(ScriptedCompletion::replies(&[
        DRAFT,
        r#"{"type":"FinalAnswer","data":{"answer":"ok"}}"#,
    ]));
    let services = services_with(
        completion.clone(),
        Arc::new(StaticRetriever::new(&[])),
        Arc::new(StaticReference::new("")),
    );
    let runtime = build_workflow_graph().unwrap();
    let history = vec![
        ChatMessage::user("What is FIFO?"),
        ChatMessage::assistant("First in, first out."),
    ];

    process_user_question(&runtime, &services, QUESTION, history.clone())
        .await
        .unwrap();

    let draft_request = &completion.requests()[0];
    assert_eq!(draft_request.messages[1..3], history[..]);
    assert_eq!(
        draft_request.messages.last(),
        Some(&ChatMessage::user(QUESTION))
    );
}

#[test]
fn workflow_graph_is_acyclic_with_labelled_branches() {
    let runtime = build_workflow_graph().unwrap();
    assert!(!runtime.has_cycle());
    assert_eq!(runtime.entry_node_id(), RAG_AGENT);

    let mut ids = runtime.node_ids();
    ids.sort();
    assert_eq!(ids, vec![RAG_AGENT, SUPERVISOR, ENRICH, FINALIZE]);

    let mut branches = runtime.edges_from(SUPERVISOR);
    branches.sort_by_key(|(target, _)| *target);
    assert_eq!(
        branches,
        vec![
            (ENRICH, &EdgeCondition::on("enrich_with_wikipedia")),
            (FINALIZE, &EdgeCondition::on("prepare_final_response")),
        ]
    );
    assert!(runtime.edges_from(ENRICH).is_empty());
    assert!(runtime.edges_from(FINALIZE).is_empty());
}

fn decided_state(decision: SupervisorDecision) -> WorkflowState {
    let mut state = WorkflowState::new(QUESTION, Vec::new());
    state.set_draft(DRAFT.to_string()).unwrap();
    state.set_decision(decision).unwrap();
    state
}

#[tokio::test]
async fn finalizer_rejects_enrichment_decisions() {
    let harness = Harness::new(Vec::new());
    let ctx = NodeContext {
        services: &harness.services,
    };
    let mut state = decided_state(SupervisorDecision::ComplementWithWikipedia {
        reasoning: "r".into(),
        search_query: "q".into(),
    });

    let err = FinalizeNode::new().execute(&mut state, &ctx).await.unwrap_err();

    assert_eq!(err.node_id, FINALIZE);
    assert!(state.final_answer().is_none());
}

#[tokio::test]
async fn enrich_rejects_terminal_decisions() {
    let harness = Harness::new(Vec::new());
    let ctx = NodeContext {
        services: &harness.services,
    };
    let mut state = decided_state(SupervisorDecision::FinalAnswer {
        answer: DRAFT.into(),
    });

    let err = EnrichNode::new().execute(&mut state, &ctx).await.unwrap_err();

    assert_eq!(err.node_id, ENRICH);
    assert_eq!(harness.completion.call_count(), 0);
}

#[tokio::test]
async fn finalizer_is_idempotent_across_runs() {
    let decision = SupervisorDecision::CorrectAndRefine {
        reasoning: "tone".into(),
        corrected_answer: "Refined.".into(),
    };
    let harness = Harness::new(Vec::new());
    let ctx = NodeContext {
        services: &harness.services,
    };

    let mut first = decided_state(decision.clone());
    let mut second = decided_state(decision);
    FinalizeNode::new().execute(&mut first, &ctx).await.unwrap();
    FinalizeNode::new().execute(&mut second, &ctx).await.unwrap();

    assert_eq!(first.final_answer(), Some("Refined."));
    assert_eq!(first.final_answer(), second.final_answer());
    assert_eq!(harness.completion.call_count(), 0);
}
