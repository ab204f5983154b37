use std::sync::Arc;

use super::retriever::KnowledgeRetriever;
use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, ChatRequest, CompletionProvider};

const NO_CONTEXT_NOTE: &str = "No relevant context was found in the knowledge base for this question.";

/// Drafts the first answer for a question from retrieved knowledge passages.
#[derive(Clone)]
pub struct AnswerGenerator {
    completion: Arc<dyn CompletionProvider>,
    retriever: Arc<dyn KnowledgeRetriever>,
    top_k: usize,
}

impl AnswerGenerator {
    pub fn new(
        completion: Arc<dyn CompletionProvider>,
        retriever: Arc<dyn KnowledgeRetriever>,
        top_k: usize,
    ) -> Self {
        Self {
            completion,
            retriever,
            top_k,
        }
    }

    /// One retrieval and one chat completion. Both failures propagate as
    /// upstream errors; an empty completion is treated as one too.
    pub async fn generate(
        &self,
        question: &str,
        history: &[ChatMessage],
    ) -> Result<String, ApiError> {
        let passages = self.retriever.retrieve(question, self.top_k).await?;
        tracing::info!(
            retriever = self.retriever.name(),
            passages = passages.len(),
            "Retrieved knowledge context"
        );

        let request = ChatRequest::new(build_answer_messages(&passages, history, question));
        let draft = self.completion.chat(request).await?;
        let draft = draft.trim();
        if draft.is_empty() {
            return Err(ApiError::UpstreamUnavailable(
                "completion service returned an empty answer".to_string(),
            ));
        }
        Ok(draft.to_string())
    }
}

/// System prompt with context, prior turns, then the question.
pub fn build_answer_messages(
    passages: &[String],
    history: &[ChatMessage],
    question: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(answer_system_prompt(passages)));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(question));
    messages
}

fn answer_system_prompt(passages: &[String]) -> String {
    let context = if passages.is_empty() {
        NO_CONTEXT_NOTE.to_string()
    } else {
        passages.join("\n\n")
    };
    format!(
        "You are \"Ingenierin\", an assistant for students of a foundation that trains \
entrepreneurs running shops, minimarkets and small businesses.\n\
Give clear, practical and specific guidance on logistics, inventory management, \
warehousing and replenishment, grounding your answer on the context below.\n\
Follow these rules:\n\
1. Use a formal but friendly tone suited to a practical classroom.\n\
2. Format the answer with Markdown (bold, lists, headings when useful) and leave \
blank lines between sections so it is easy to scan.\n\
3. Briefly explain how the context supported the answer when it did.\n\
4. Never ask the user to clarify the question. If the context is incomplete, give \
the most useful guidance you can from what it does contain, without inventing data.\n\
5. Only answer questions about logistics, finance, inventory, warehousing and \
replenishment. For anything else, say briefly and politely that you cannot help.\n\n\
Context:\n{context}"
    )
}
