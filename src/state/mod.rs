use std::sync::Arc;

use crate::core::config::Settings;
use crate::graph::{build_workflow_graph, GraphRuntime, WorkflowOptions, WorkflowServices};
use crate::history::ConversationStore;
use crate::llm::AzureOpenAiProvider;
use crate::rag::AzureSearchRetriever;
use crate::tools::WikipediaLookup;

pub mod error;

use error::InitializationError;

/// Application state shared across all routes.
///
/// Provider clients and the workflow graph are built once and never
/// mutated; the conversation store is the only shared mutable piece.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub services: WorkflowServices,
    pub conversations: ConversationStore,
    pub graph_runtime: Arc<GraphRuntime>,
}

impl AppState {
    /// Builds the Azure OpenAI, Azure Cognitive Search and Wikipedia clients
    /// on one shared `reqwest::Client` carrying the configured timeout.
    pub fn initialize(settings: Settings) -> Result<Arc<Self>, InitializationError> {
        let client = reqwest::Client::builder()
            .timeout(settings.llm.request_timeout)
            .build()
            .map_err(InitializationError::HttpClient)?;

        let services = WorkflowServices {
            completion: Arc::new(AzureOpenAiProvider::new(&settings.llm, client.clone())),
            retriever: Arc::new(AzureSearchRetriever::new(&settings.retrieval, client.clone())),
            reference: Arc::new(WikipediaLookup::new(&settings.reference.language, client)),
            options: workflow_options(&settings),
        };

        Self::with_services(settings, services)
    }

    pub fn with_services(
        settings: Settings,
        services: WorkflowServices,
    ) -> Result<Arc<Self>, InitializationError> {
        let graph_runtime = build_workflow_graph().map_err(InitializationError::Graph)?;

        tracing::info!(
            entry = graph_runtime.entry_node_id(),
            nodes = ?graph_runtime.node_ids(),
            retrieval_top_k = services.options.retrieval_top_k,
            reference_max_chars = services.options.reference_max_chars,
            "Workflow graph ready"
        );

        Ok(Arc::new(Self {
            settings: Arc::new(settings),
            services,
            conversations: ConversationStore::new(),
            graph_runtime: Arc::new(graph_runtime),
        }))
    }
}

pub fn workflow_options(settings: &Settings) -> WorkflowOptions {
    WorkflowOptions {
        retrieval_top_k: settings.retrieval.top_k,
        reference_max_results: settings.reference.max_results,
        reference_max_chars: settings.reference.max_chars,
    }
}
