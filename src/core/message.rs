use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::ids::create_id;

pub const ASSISTANT_NAME: &str = "Ollama";
pub const ASSISTANT_AVATAR: &str = "OL";
pub const USER_NAME: &str = "You";
pub const USER_AVATAR: &str = "YO";

/// Transcript text shown in place of a reply when the chat request fails.
pub const REQUEST_FAILED_TEXT: &str = "⚠️ Failed to reach AI. Check your connection.";
/// Content used for a user message that only carries attachments.
pub const ATTACHMENT_ONLY_TEXT: &str = "Sent a message";
pub const NEW_CHAT_GREETING: &str = "New chat started. How can I help you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    pub fn default_name(self) -> &'static str {
        match self {
            Role::User => USER_NAME,
            Role::Assistant => ASSISTANT_NAME,
        }
    }

    pub fn default_avatar(self) -> &'static str {
        match self {
            Role::User => USER_AVATAR,
            Role::Assistant => ASSISTANT_AVATAR,
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Upvote,
    Downvote,
}

/// An image staged in the composer or carried by a sent user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub size: u64,
    /// Inline `data:` URL used for previews.
    pub preview: String,
}

/// Sidebar entry for one conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: Role,
    pub name: String,
    pub avatar_fallback: String,
    pub content: String,
    pub markdown: bool,
    pub attachments: Option<Vec<Attachment>>,
    pub reaction: Option<Reaction>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(conversation_id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: create_id(),
            conversation_id: conversation_id.into(),
            role,
            name: role.default_name().to_string(),
            avatar_fallback: role.default_avatar().to_string(),
            content: content.into(),
            markdown: role == Role::Assistant,
            attachments: None,
            reaction: None,
            created_at: Utc::now(),
        }
    }

    pub fn user(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(conversation_id, Role::User, content)
    }

    pub fn assistant(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(conversation_id, Role::Assistant, content)
    }

    /// Plain-text assistant message reporting a failed chat request.
    pub fn request_failed(conversation_id: impl Into<String>) -> Self {
        let mut message = Self::assistant(conversation_id, REQUEST_FAILED_TEXT);
        message.markdown = false;
        message
    }

    /// Stand-in shown for a conversation that has no stored history.
    pub fn placeholder(conversation: &Conversation) -> Self {
        Self::assistant(
            conversation.id.clone(),
            format!(
                "Placeholder for **{}**. {}",
                conversation.title, conversation.preview
            ),
        )
    }

    pub fn with_attachments(mut self, attachments: Vec<Attachment>) -> Self {
        self.attachments = if attachments.is_empty() {
            None
        } else {
            Some(attachments)
        };
        self
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Set `kind` if it differs from the current reaction, otherwise clear it.
    pub fn toggle_reaction(&mut self, kind: Reaction) {
        self.reaction = if self.reaction == Some(kind) {
            None
        } else {
            Some(kind)
        };
    }
}
