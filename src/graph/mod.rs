// Workflow graph
// petgraph StateGraph running draft -> supervisor review -> enrich | finalize

pub mod builder;
pub mod decision;
pub mod driver;
pub mod node;
pub mod nodes;
pub mod prompts;
pub mod runtime;
pub mod state;

#[cfg(test)]
mod tests;

pub use builder::build_workflow_graph;
pub use decision::{route_decision, DecisionRoute, SupervisorDecision};
pub use driver::{process_user_question, WorkflowOutcome};
pub use node::{GraphError, Node, NodeContext, NodeOutput, WorkflowOptions, WorkflowServices};
pub use runtime::GraphRuntime;
pub use state::{WorkflowPhase, WorkflowState};
