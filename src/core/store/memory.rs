use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ConversationStore, StoreError};
use crate::api::{ConversationPayload, MessageRecord};
use crate::core::message::{Conversation, Role};

pub const DEFAULT_CONVERSATION_PREVIEW: &str = "New conversation";

#[derive(Default)]
struct StoreData {
    /// Most recently created first.
    conversations: Vec<Conversation>,
    messages: HashMap<String, Vec<MessageRecord>>,
}

/// Process-local store; every instance is isolated.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with the development welcome conversation.
    pub fn with_welcome() -> Self {
        let conversation = Conversation {
            id: "1".to_string(),
            title: "Welcome Chat".to_string(),
            preview: "Hello! I'm your AI assistant.".to_string(),
            timestamp: "Just now".to_string(),
        };
        let greeting = MessageRecord {
            id: "1".to_string(),
            conversation_id: "1".to_string(),
            role: Role::Assistant.as_str().to_string(),
            name: Some(Role::Assistant.default_name().to_string()),
            avatar_fallback: Some(Role::Assistant.default_avatar().to_string()),
            content: "Hello! I'm running on your private Ollama instance. Ask me anything!"
                .to_string(),
            markdown: Some(true),
            attachments: None,
            reaction: None,
            created_at: Some(Utc::now().to_rfc3339()),
        };

        let mut messages = HashMap::new();
        messages.insert(conversation.id.clone(), vec![greeting]);
        Self {
            data: RwLock::new(StoreData {
                conversations: vec![conversation],
                messages,
            }),
        }
    }

    pub async fn conversation_count(&self) -> usize {
        self.data.read().await.conversations.len()
    }

    pub async fn message_count(&self, conversation_id: &str) -> usize {
        self.data
            .read()
            .await
            .messages
            .get(conversation_id)
            .map(Vec::len)
            .unwrap_or_default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, StoreError> {
        Ok(self.data.read().await.conversations.clone())
    }

    async fn save_conversation(&self, payload: &ConversationPayload) -> Result<(), StoreError> {
        if payload.id.is_empty() || payload.title.is_empty() {
            return Err(StoreError::Rejected("Missing required fields".to_string()));
        }

        let conversation = Conversation {
            id: payload.id.clone(),
            title: payload.title.clone(),
            preview: payload
                .preview
                .clone()
                .filter(|preview| !preview.is_empty())
                .unwrap_or_else(|| DEFAULT_CONVERSATION_PREVIEW.to_string()),
            timestamp: payload
                .timestamp
                .clone()
                .filter(|stamp| !stamp.is_empty())
                .unwrap_or_else(|| Utc::now().to_rfc3339()),
        };

        let mut data = self.data.write().await;
        match data
            .conversations
            .iter()
            .position(|existing| existing.id == conversation.id)
        {
            Some(index) => data.conversations[index] = conversation,
            None => data.conversations.insert(0, conversation),
        }
        data.messages.entry(payload.id.clone()).or_default();
        Ok(())
    }

    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<MessageRecord>, StoreError> {
        Ok(self
            .data
            .read()
            .await
            .messages
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_message(&self, record: &MessageRecord) -> Result<(), StoreError> {
        if record.id.is_empty()
            || record.conversation_id.is_empty()
            || record.role.is_empty()
            || record.content.is_empty()
        {
            return Err(StoreError::Rejected("Missing required fields".to_string()));
        }

        let role = Role::try_from(record.role.as_str()).map_err(StoreError::Rejected)?;
        let mut stored = record.clone();
        stored.name = stored
            .name
            .filter(|name| !name.is_empty())
            .or_else(|| Some(role.default_name().to_string()));
        stored.avatar_fallback = stored
            .avatar_fallback
            .filter(|avatar| !avatar.is_empty())
            .or_else(|| Some(role.default_avatar().to_string()));
        stored.markdown = Some(stored.markdown.unwrap_or(role == Role::Assistant));
        stored.created_at = Some(Utc::now().to_rfc3339());

        self.data
            .write()
            .await
            .messages
            .entry(record.conversation_id.clone())
            .or_default()
            .push(stored);
        Ok(())
    }
}
