//! Conversation persistence behind a single trait.
//!
//! [`http::HttpStore`] talks to the JSON API; [`memory::MemoryStore`] keeps
//! everything in process for development and tests. Both are constructed
//! once and shared as `Arc<dyn ConversationStore>`.

pub mod http;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::error::Error as StdError;
use std::fmt;
use tracing::debug;

use crate::api::{ConversationPayload, MessageRecord};
use crate::core::message::{Attachment, Conversation, Message, Reaction, Role};

#[derive(Debug)]
pub enum StoreError {
    /// The request could not be sent or its body could not be read.
    Request(reqwest::Error),
    /// The store answered with a non-success status.
    Status { status: u16, body: String },
    /// The response body did not match the expected shape.
    Decode(serde_json::Error),
    /// The store refused the payload (missing required fields).
    Rejected(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Request(err) => write!(f, "store request failed: {err}"),
            StoreError::Status { status, body } => {
                write!(f, "store returned HTTP {status}: {}", body.trim())
            }
            StoreError::Decode(err) => write!(f, "unexpected store response: {err}"),
            StoreError::Rejected(reason) => write!(f, "store rejected payload: {reason}"),
        }
    }
}

impl StdError for StoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StoreError::Request(err) => Some(err),
            StoreError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Request(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err)
    }
}

#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, StoreError>;

    /// Create or replace a conversation.
    async fn save_conversation(&self, payload: &ConversationPayload) -> Result<(), StoreError>;

    /// Messages for one conversation, oldest first.
    async fn list_messages(&self, conversation_id: &str) -> Result<Vec<MessageRecord>, StoreError>;

    async fn save_message(&self, record: &MessageRecord) -> Result<(), StoreError>;
}

impl MessageRecord {
    pub fn from_message(message: &Message) -> Self {
        let attachments = message
            .attachments
            .as_ref()
            .and_then(|list| serde_json::to_string(list).ok());
        Self {
            id: message.id.clone(),
            conversation_id: message.conversation_id.clone(),
            role: message.role.as_str().to_string(),
            name: Some(message.name.clone()),
            avatar_fallback: Some(message.avatar_fallback.clone()),
            content: message.content.clone(),
            markdown: Some(message.markdown),
            attachments,
            reaction: None,
            created_at: Some(message.created_at.to_rfc3339()),
        }
    }

    /// Convert a stored row back into a transcript message, filling the
    /// defaults older rows omit. Rows with an unknown role are dropped.
    pub fn into_message(self, conversation_id: &str) -> Option<Message> {
        let role = match Role::try_from(self.role.as_str()) {
            Ok(role) => role,
            Err(err) => {
                debug!(id = %self.id, error = %err, "dropping stored message");
                return None;
            }
        };

        let attachments = self.attachments.as_deref().and_then(|text| {
            serde_json::from_str::<Vec<Attachment>>(text)
                .map_err(|err| debug!(id = %self.id, error = %err, "ignoring unreadable attachments"))
                .ok()
        });
        let reaction = match self.reaction.as_deref() {
            Some("upvote") => Some(Reaction::Upvote),
            Some("downvote") => Some(Reaction::Downvote),
            _ => None,
        };
        let created_at = self
            .created_at
            .as_deref()
            .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
            .map(|stamp| stamp.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        let conversation_id = if self.conversation_id.is_empty() {
            conversation_id.to_string()
        } else {
            self.conversation_id
        };

        Some(Message {
            id: self.id,
            conversation_id,
            role,
            name: self
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| role.default_name().to_string()),
            avatar_fallback: self
                .avatar_fallback
                .filter(|avatar| !avatar.is_empty())
                .unwrap_or_else(|| role.default_avatar().to_string()),
            content: self.content,
            markdown: self.markdown.unwrap_or(role == Role::Assistant),
            attachments,
            reaction,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_rows_get_role_defaults() {
        let record: MessageRecord = serde_json::from_str(
            r#"{"id":"m1","role":"assistant","content":"hi","attachments":null}"#,
        )
        .unwrap();
        let message = record.into_message("c1").expect("valid role");
        assert_eq!(message.conversation_id, "c1");
        assert_eq!(message.name, "Ollama");
        assert_eq!(message.avatar_fallback, "OL");
        assert!(message.markdown);
        assert!(message.attachments.is_none());
    }

    #[test]
    fn attachments_survive_the_json_text_field() {
        let attachment = Attachment {
            id: "a1".into(),
            name: "cat.png".into(),
            mime_type: "image/png".into(),
            size: 3,
            preview: "data:image/png;base64,AAAA".into(),
        };
        let message = Message::user("c1", "look").with_attachments(vec![attachment.clone()]);
        let record = MessageRecord::from_message(&message);
        let text = record.attachments.clone().expect("serialized");
        assert!(text.contains("\"type\":\"image/png\""));

        let restored = record.into_message("c1").unwrap();
        assert_eq!(restored.attachments, Some(vec![attachment]));
        assert!(!restored.markdown);
        assert_eq!(restored.created_at, message.created_at);
    }

    #[test]
    fn unknown_roles_and_bad_attachments_are_tolerated() {
        let record: MessageRecord =
            serde_json::from_str(r#"{"id":"m1","role":"system","content":"x"}"#).unwrap();
        assert!(record.into_message("c1").is_none());

        let record: MessageRecord = serde_json::from_str(
            r#"{"id":"m2","role":"user","content":"x","attachments":"not json","reaction":"upvote"}"#,
        )
        .unwrap();
        let message = record.into_message("c1").unwrap();
        assert!(message.attachments.is_none());
        assert_eq!(message.reaction, Some(Reaction::Upvote));
    }
}
