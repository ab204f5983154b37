use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::errors::ApiError;
use crate::llm::ChatMessage;

const TITLE_WORDS: usize = 6;
const DEFAULT_TITLE: &str = "New Conversation";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: u64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    activity: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: u64,
    pub conversation_id: u64,
    pub content: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

impl StoredMessage {
    fn to_chat_message(&self) -> ChatMessage {
        if self.is_user {
            ChatMessage::user(self.content.clone())
        } else {
            ChatMessage::assistant(self.content.clone())
        }
    }
}

#[derive(Default)]
struct StoreInner {
    conversations: BTreeMap<u64, Conversation>,
    messages: Vec<StoredMessage>,
    next_conversation_id: u64,
    next_message_id: u64,
    activity: u64,
}

/// Process-local conversation log. Contents are lost on restart.
#[derive(Clone, Default)]
pub struct ConversationStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create_conversation(&self, first_message: &str) -> Conversation {
        let mut inner = self.inner.write().await;
        inner.next_conversation_id += 1;
        inner.activity += 1;
        let now = Utc::now();
        let conversation = Conversation {
            id: inner.next_conversation_id,
            title: conversation_title(first_message),
            created_at: now,
            updated_at: now,
            activity: inner.activity,
        };
        inner
            .conversations
            .insert(conversation.id, conversation.clone());
        conversation
    }

    pub async fn get_conversation(&self, id: u64) -> Option<Conversation> {
        self.inner.read().await.conversations.get(&id).cloned()
    }

    /// Appends a message and bumps the conversation's `updated_at`.
    pub async fn add_message(
        &self,
        conversation_id: u64,
        content: &str,
        is_user: bool,
    ) -> Result<StoredMessage, ApiError> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let activity = inner.activity + 1;
        let Some(conversation) = inner.conversations.get_mut(&conversation_id) else {
            return Err(conversation_not_found(conversation_id));
        };
        conversation.updated_at = now;
        conversation.activity = activity;
        inner.activity = activity;

        inner.next_message_id += 1;
        let message = StoredMessage {
            id: inner.next_message_id,
            conversation_id,
            content: content.to_string(),
            is_user,
            timestamp: now,
        };
        inner.messages.push(message.clone());
        Ok(message)
    }

    /// Most recently active first.
    pub async fn list_conversations(&self) -> Vec<Conversation> {
        let inner = self.inner.read().await;
        let mut conversations: Vec<Conversation> = inner.conversations.values().cloned().collect();
        conversations.sort_by(|a, b| b.activity.cmp(&a.activity));
        conversations
    }

    pub async fn messages(&self, conversation_id: u64) -> Result<Vec<StoredMessage>, ApiError> {
        let inner = self.inner.read().await;
        if !inner.conversations.contains_key(&conversation_id) {
            return Err(conversation_not_found(conversation_id));
        }
        Ok(inner
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect())
    }

    /// The last `limit` messages as chat turns, oldest first.
    pub async fn recent_history(
        &self,
        conversation_id: u64,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, ApiError> {
        let messages = self.messages(conversation_id).await?;
        let skip = messages.len().saturating_sub(limit);
        Ok(messages
            .iter()
            .skip(skip)
            .map(StoredMessage::to_chat_message)
            .collect())
    }
}

/// First six words of the opening message, with an ellipsis when cut.
pub fn conversation_title(message: &str) -> String {
    let words: Vec<&str> = message.split_whitespace().collect();
    if words.is_empty() {
        return DEFAULT_TITLE.to_string();
    }
    let mut title = words
        .iter()
        .take(TITLE_WORDS)
        .copied()
        .collect::<Vec<_>>()
        .join(" ");
    if words.len() > TITLE_WORDS {
        title.push_str("...");
    }
    title
}

fn conversation_not_found(id: u64) -> ApiError {
    ApiError::NotFound(format!("conversation {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_truncates_after_six_words() {
        assert_eq!(
            conversation_title("How do I compute the reorder point for rice?"),
            "How do I compute the reorder..."
        );
        assert_eq!(conversation_title("What is FIFO?"), "What is FIFO?");
        assert_eq!(conversation_title("   "), "New Conversation");
    }

    #[tokio::test]
    async fn ids_start_at_one_and_increase() {
        let store = ConversationStore::new();
        let first = store.create_conversation("first").await;
        let second = store.create_conversation("second").await;
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let m1 = store.add_message(first.id, "hello", true).await.unwrap();
        let m2 = store.add_message(second.id, "hi", true).await.unwrap();
        assert_eq!((m1.id, m2.id), (1, 2));
    }

    #[tokio::test]
    async fn unknown_conversation_is_not_found() {
        let store = ConversationStore::new();
        let err = store.add_message(7, "hello", true).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(store.messages(7).await.is_err());
        assert!(store.get_conversation(7).await.is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let store = ConversationStore::new();
        let older = store.create_conversation("older").await;
        let newer = store.create_conversation("newer").await;
        store.add_message(older.id, "bump", true).await.unwrap();

        let ids: Vec<u64> = store.list_conversations().await.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![older.id, newer.id]);
    }

    #[tokio::test]
    async fn recent_history_keeps_last_turns_in_order() {
        let store = ConversationStore::new();
        let conv = store.create_conversation("q1").await;
        store.add_message(conv.id, "q1", true).await.unwrap();
        store.add_message(conv.id, "a1", false).await.unwrap();
        store.add_message(conv.id, "q2", true).await.unwrap();
        store.add_message(conv.id, "a2", false).await.unwrap();

        let history = store.recent_history(conv.id, 3).await.unwrap();
        assert_eq!(
            history,
            vec![
                ChatMessage::assistant("a1"),
                ChatMessage::user("q2"),
                ChatMessage::assistant("a2"),
            ]
        );
        assert!(store.recent_history(conv.id, 0).await.unwrap().is_empty());
    }
}
