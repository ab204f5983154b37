// Graph Builder
// Wires the supervised answer workflow

use super::decision::DecisionRoute;
use super::node::GraphError;
use super::nodes::{
    EnrichNode, FinalizeNode, RagAgentNode, SupervisorNode, ENRICH, FINALIZE, RAG_AGENT,
    SUPERVISOR,
};
use super::runtime::{EdgeCondition, GraphBuilder, GraphRuntime};

/// draft -> review -> (enrich | finalize). Every path ends in four steps or fewer.
pub fn build_workflow_graph() -> Result<GraphRuntime, GraphError> {
    let runtime = GraphBuilder::new()
        .entry(RAG_AGENT)
        .max_steps(8)
        .node(Box::new(RagAgentNode::new()))
        .node(Box::new(SupervisorNode::new()))
        .node(Box::new(EnrichNode::new()))
        .node(Box::new(FinalizeNode::new()))
        .edge(RAG_AGENT, SUPERVISOR)
        .conditional_edge(SUPERVISOR, ENRICH, DecisionRoute::Enrich.as_str())
        .conditional_edge(SUPERVISOR, FINALIZE, DecisionRoute::Finalize.as_str())
        .build()?;

    check_wiring(&runtime)?;
    Ok(runtime)
}

/// Every supervisor route needs its own edge, and no run may loop.
fn check_wiring(runtime: &GraphRuntime) -> Result<(), GraphError> {
    if runtime.has_cycle() {
        return Err(GraphError::new("runtime", "workflow graph contains a cycle"));
    }

    let branches = runtime.edges_from(SUPERVISOR);
    for route in [DecisionRoute::Enrich, DecisionRoute::Finalize] {
        let condition = EdgeCondition::on(route.as_str());
        if !branches.iter().any(|(_, edge)| **edge == condition) {
            return Err(GraphError::new(
                SUPERVISOR,
                format!("no edge for route {}", route.as_str()),
            ));
        }
    }
    Ok(())
}
