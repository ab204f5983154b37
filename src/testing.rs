//! Hand-written doubles for the external collaborators.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::core::config::settings::{
    AppSettings, ConversationSettings, LlmSettings, LoggingSettings, ReferenceSettings,
    RetrievalSettings, ServerSettings, Settings,
};
use crate::core::errors::ApiError;
use crate::graph::{WorkflowOptions, WorkflowServices};
use crate::llm::{ChatRequest, CompletionProvider};
use crate::rag::KnowledgeRetriever;
use crate::tools::ReferenceLookup;

/// Replies with scripted completions in order and records every request.
pub struct ScriptedCompletion {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedCompletion {
    pub fn new(replies: Vec<Result<String, String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replies(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Last message of each request, which is the prompt for single-turn calls.
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.messages.last().map(|m| m.content.clone()))
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionProvider for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, ApiError> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(ApiError::UpstreamUnavailable(msg)),
            None => Err(ApiError::Internal("no scripted completion left".to_string())),
        }
    }
}

pub struct StaticRetriever {
    passages: Vec<String>,
    fail: bool,
    queries: Mutex<Vec<(String, usize)>>,
}

impl StaticRetriever {
    pub fn new(passages: &[&str]) -> Self {
        Self {
            passages: passages.iter().map(|p| p.to_string()).collect(),
            fail: false,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(&[])
        }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl KnowledgeRetriever for StaticRetriever {
    fn name(&self) -> &str {
        "static"
    }

    async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>, ApiError> {
        self.queries.lock().unwrap().push((query.to_string(), top_k));
        if self.fail {
            return Err(ApiError::upstream("search index unreachable"));
        }
        Ok(self.passages.iter().take(top_k).cloned().collect())
    }
}

pub struct StaticReference {
    text: String,
    fail: bool,
    calls: Mutex<Vec<(String, usize, usize)>>,
}

impl StaticReference {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    pub fn calls(&self) -> Vec<(String, usize, usize)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReferenceLookup for StaticReference {
    fn name(&self) -> &str {
        "static"
    }

    async fn lookup(
        &self,
        query: &str,
        max_results: usize,
        max_chars: usize,
    ) -> Result<String, ApiError> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), max_results, max_chars));
        if self.fail {
            return Err(ApiError::upstream("wikipedia returned 503"));
        }
        Ok(self.text.chars().take(max_chars).collect())
    }
}

pub fn services_with(
    completion: Arc<ScriptedCompletion>,
    retriever: Arc<StaticRetriever>,
    reference: Arc<StaticReference>,
) -> WorkflowServices {
    WorkflowServices {
        completion,
        retriever,
        reference,
        options: WorkflowOptions::default(),
    }
}

pub fn services(completion: ScriptedCompletion) -> WorkflowServices {
    services_with(
        Arc::new(completion),
        Arc::new(StaticRetriever::new(&["Inventory is counted weekly."])),
        Arc::new(StaticReference::new("")),
    )
}

pub fn settings() -> Settings {
    Settings {
        app: AppSettings {
            name: "Azure AI Chatbot".to_string(),
            environment: "test".to_string(),
        },
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        llm: LlmSettings {
            api_key: "key".to_string(),
            endpoint: "https://example.openai.azure.com".to_string(),
            api_version: "2024-02-01".to_string(),
            deployment: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            request_timeout: Duration::from_secs(60),
        },
        retrieval: RetrievalSettings {
            service_name: "kb-search".to_string(),
            api_key: "search-key".to_string(),
            index_name: "knowledge-base".to_string(),
            api_version: "2023-11-01".to_string(),
            content_key: "content".to_string(),
            top_k: 5,
        },
        reference: ReferenceSettings {
            language: "en".to_string(),
            max_results: 1,
            max_chars: 2500,
        },
        conversation: ConversationSettings { history_limit: 10 },
        logging: LoggingSettings {
            dir: PathBuf::from("logs"),
            level: "info".to_string(),
        },
    }
}

pub async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
