use std::collections::HashMap;

use crate::api::ChatMessage;
use crate::core::message::{Attachment, Conversation, Message, Reaction};
use crate::utils::ids::create_id;
use crate::utils::text::{truncate_text, PREVIEW_LIMIT};

pub const JUST_NOW: &str = "Just now";
pub const UNTITLED_CHAT: &str = "Untitled chat";
pub const LOCAL_SEED_TITLE: &str = "Chat with Ollama";

/// In-memory view of every known conversation plus the composer.
///
/// All mutation goes through [`super::SessionHandle::update`], so each
/// method here runs to completion without interleaving.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// History list, newest first.
    pub conversations: Vec<Conversation>,
    messages: HashMap<String, Vec<Message>>,
    pub active_conversation_id: String,
    /// Number used for the next "Chat N" title.
    pub chat_counter: u32,
    pub composer: String,
    pub attachments: Vec<Attachment>,
    pub copied_message_id: Option<String>,
    /// Conversations with a request in flight, mapped to the assistant
    /// message being streamed once the response has started.
    in_flight: HashMap<String, Option<String>>,
    pub models: Vec<String>,
    pub selected_model: String,
    pub is_loading_history: bool,
}

impl SessionState {
    /// Fresh state holding the local seed conversation.
    pub fn new(selected_model: impl Into<String>) -> Self {
        let mut state = Self {
            conversations: Vec::new(),
            messages: HashMap::new(),
            active_conversation_id: String::new(),
            chat_counter: 2,
            composer: String::new(),
            attachments: Vec::new(),
            copied_message_id: None,
            in_flight: HashMap::new(),
            models: Vec::new(),
            selected_model: selected_model.into(),
            is_loading_history: false,
        };
        state.install_local_seed();
        state
    }

    /// Replace the history with a single local conversation that exists
    /// only in memory. Used when the store cannot create one.
    pub fn install_local_seed(&mut self) -> Conversation {
        let seed = Conversation {
            id: create_id(),
            title: LOCAL_SEED_TITLE.to_string(),
            preview: "Powered by your private AI endpoint.".to_string(),
            timestamp: JUST_NOW.to_string(),
        };
        let greeting = Message::assistant(
            seed.id.clone(),
            "Hello! I'm running on your private Ollama instance. Ask me anything!",
        );
        self.reset_history(vec![seed.clone()]);
        self.replace_messages(&seed.id, vec![greeting]);
        self.activate(&seed.id);
        seed
    }

    pub fn conversation(&self, conversation_id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == conversation_id)
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.conversation(&self.active_conversation_id)
    }

    pub fn active_title(&self) -> &str {
        self.active_conversation()
            .map(|c| c.title.as_str())
            .unwrap_or(UNTITLED_CHAT)
    }

    pub fn messages(&self, conversation_id: &str) -> &[Message] {
        self.messages
            .get(conversation_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn active_messages(&self) -> &[Message] {
        self.messages(&self.active_conversation_id)
    }

    pub fn is_cached(&self, conversation_id: &str) -> bool {
        self.messages.contains_key(conversation_id)
    }

    pub fn find_message(&self, conversation_id: &str, message_id: &str) -> Option<&Message> {
        self.messages(conversation_id)
            .iter()
            .find(|m| m.id == message_id)
    }

    fn find_message_mut(&mut self, conversation_id: &str, message_id: &str) -> Option<&mut Message> {
        self.messages
            .get_mut(conversation_id)?
            .iter_mut()
            .find(|m| m.id == message_id)
    }

    /// Replace the history list and drop every cached transcript.
    pub fn reset_history(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations;
        self.messages.clear();
    }

    pub fn prepend_conversation(&mut self, conversation: Conversation) {
        self.conversations.retain(|c| c.id != conversation.id);
        self.conversations.insert(0, conversation);
    }

    pub fn replace_messages(&mut self, conversation_id: &str, messages: Vec<Message>) {
        self.messages.insert(conversation_id.to_string(), messages);
    }

    /// Install a freshly loaded transcript, keeping any message that was
    /// appended locally while the load was in progress.
    pub fn merge_loaded(&mut self, conversation_id: &str, loaded: Vec<Message>) {
        let local = self.messages.remove(conversation_id).unwrap_or_default();
        let mut merged = loaded;
        for message in local {
            if !merged.iter().any(|m| m.id == message.id) {
                merged.push(message);
            }
        }
        self.messages.insert(conversation_id.to_string(), merged);
    }

    pub fn update_conversation_messages<R>(
        &mut self,
        conversation_id: &str,
        updater: impl FnOnce(&mut Vec<Message>) -> R,
    ) -> R {
        updater(self.messages.entry(conversation_id.to_string()).or_default())
    }

    pub fn push_message(&mut self, message: Message) {
        let conversation_id = message.conversation_id.clone();
        self.update_conversation_messages(&conversation_id, |messages| messages.push(message));
    }

    /// Overwrite the content of a streaming message. Returns `false` when
    /// the message is unknown.
    pub fn set_message_content(&mut self, conversation_id: &str, message_id: &str, content: &str) -> bool {
        match self.find_message_mut(conversation_id, message_id) {
            Some(message) => {
                message.content.clear();
                message.content.push_str(content);
                true
            }
            None => false,
        }
    }

    /// Turn a partially streamed message into the request-failed notice,
    /// keeping its id and position. Appends a new notice when the message
    /// does not exist.
    pub fn replace_with_failure(&mut self, conversation_id: &str, message_id: Option<&str>) -> Message {
        let failure = Message::request_failed(conversation_id);
        if let Some(existing) = message_id.and_then(|id| self.find_message_mut(conversation_id, id)) {
            existing.content = failure.content;
            existing.markdown = false;
            existing.reaction = None;
            return existing.clone();
        }
        self.push_message(failure.clone());
        failure
    }

    /// Toggle a reaction on a message of the active conversation and return
    /// the resulting value, or `None` if the message is not there.
    pub fn toggle_reaction(&mut self, message_id: &str, kind: Reaction) -> Option<Option<Reaction>> {
        let conversation_id = self.active_conversation_id.clone();
        let message = self.find_message_mut(&conversation_id, message_id)?;
        message.toggle_reaction(kind);
        Some(message.reaction)
    }

    pub fn refresh_history_preview(&mut self, conversation_id: &str, preview: &str, title: Option<&str>) {
        if let Some(conversation) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            if let Some(title) = title {
                conversation.title = title.to_string();
            }
            conversation.preview = truncate_text(preview, PREVIEW_LIMIT);
            conversation.timestamp = JUST_NOW.to_string();
        }
    }

    /// Chat history sent to the model: every user/assistant message so far.
    pub fn chat_history(&self, conversation_id: &str) -> Vec<ChatMessage> {
        self.messages(conversation_id)
            .iter()
            .map(|m| ChatMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    pub fn next_chat_title(&mut self) -> String {
        let title = format!("Chat {}", self.chat_counter);
        self.chat_counter += 1;
        title
    }

    /// Make `conversation_id` active and reset the composer.
    pub fn activate(&mut self, conversation_id: &str) {
        self.active_conversation_id = conversation_id.to_string();
        self.clear_composer();
    }

    pub fn clear_composer(&mut self) {
        self.composer.clear();
        self.attachments.clear();
        self.copied_message_id = None;
    }

    pub fn has_pending_input(&self) -> bool {
        !self.composer.trim().is_empty() || !self.attachments.is_empty()
    }

    pub fn is_generating(&self) -> bool {
        self.is_generating_for(&self.active_conversation_id)
    }

    pub fn is_generating_for(&self, conversation_id: &str) -> bool {
        self.in_flight.contains_key(conversation_id)
    }

    /// Streaming message id of the active conversation, if any.
    pub fn streaming_message_id(&self) -> Option<&str> {
        self.in_flight
            .get(&self.active_conversation_id)
            .and_then(|id| id.as_deref())
    }

    /// Claim the conversation for a new request. Fails while another
    /// request for it is still running.
    pub fn begin_generation(&mut self, conversation_id: &str) -> bool {
        if self.in_flight.contains_key(conversation_id) {
            return false;
        }
        self.in_flight.insert(conversation_id.to_string(), None);
        true
    }

    pub fn set_streaming_message(&mut self, conversation_id: &str, message_id: &str) {
        self.in_flight
            .insert(conversation_id.to_string(), Some(message_id.to_string()));
    }

    pub fn finish_generation(&mut self, conversation_id: &str) {
        self.in_flight.remove(conversation_id);
    }

    pub fn stage_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    pub fn remove_attachment(&mut self, attachment_id: &str) -> bool {
        let before = self.attachments.len();
        self.attachments.retain(|a| a.id != attachment_id);
        self.attachments.len() != before
    }
}
