// Graph Nodes Module
// One node per workflow step

pub mod enrich;
pub mod finalize;
pub mod rag_agent;
pub mod supervisor;

pub use enrich::EnrichNode;
pub use finalize::FinalizeNode;
pub use rag_agent::RagAgentNode;
pub use supervisor::SupervisorNode;

pub const RAG_AGENT: &str = "call_rag_agent";
pub const SUPERVISOR: &str = "call_supervisor_agent";
pub const ENRICH: &str = "enrich_with_wikipedia";
pub const FINALIZE: &str = "prepare_final_response";
