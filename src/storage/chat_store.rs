use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use crate::models::{Chat, ChatMessage, Role};
use crate::storage::storage_manager::StorageManager;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Chat not found: {0}")]
    ChatNotFound(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
    #[error("Failed to (de)serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Append-only chat persistence. Every call is a single-record write or a read;
/// no operation spans several records atomically.
#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_chat(&self, user_id: &str, title: &str) -> Result<Chat, StoreError>;

    async fn append_message(
        &self,
        chat_id: &str,
        role: Role,
        content: &str,
        metadata: Value,
    ) -> Result<ChatMessage, StoreError>;

    /// Messages of a chat in the order they were appended.
    async fn list_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, StoreError>;
}

struct ChatRecord {
    chat: Chat,
    messages: Vec<ChatMessage>,
}

/// Process-local store, used by default and in tests.
#[derive(Default)]
pub struct InMemoryChatStore {
    chats: RwLock<HashMap<String, ChatRecord>>,
}

impl InMemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn chat_count(&self) -> usize {
        self.chats.read().await.len()
    }

    pub async fn get_chat(&self, chat_id: &str) -> Option<Chat> {
        self.chats.read().await.get(chat_id).map(|record| record.chat.clone())
    }
}

#[async_trait]
impl ChatStore for InMemoryChatStore {
    async fn create_chat(&self, user_id: &str, title: &str) -> Result<Chat, StoreError> {
        let chat = Chat {
            id: StorageManager::new_chat_id(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            created_at: Utc::now(),
        };

        self.chats.write().await.insert(
            chat.id.clone(),
            ChatRecord {
                chat: chat.clone(),
                messages: Vec::new(),
            },
        );

        debug!("Created chat {} for user {}", chat.id, user_id);
        Ok(chat)
    }

    async fn append_message(
        &self,
        chat_id: &str,
        role: Role,
        content: &str,
        metadata: Value,
    ) -> Result<ChatMessage, StoreError> {
        let mut chats = self.chats.write().await;
        let record = chats
            .get_mut(chat_id)
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.to_string()))?;

        let message = ChatMessage {
            id: StorageManager::new_message_id(),
            chat_id: chat_id.to_string(),
            role,
            content: content.to_string(),
            metadata,
            created_at: Utc::now(),
        };
        record.messages.push(message.clone());

        Ok(message)
    }

    async fn list_messages(&self, chat_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        self.chats
            .read()
            .await
            .get(chat_id)
            .map(|record| record.messages.clone())
            .ok_or_else(|| StoreError::ChatNotFound(chat_id.to_string()))
    }
}
