use tracing::{debug, info, warn};

use super::session::{JUST_NOW, UNTITLED_CHAT};
use super::{ChatApp, SessionEvent};
use crate::api::ConversationPayload;
use crate::core::message::{Conversation, Message, NEW_CHAT_GREETING};
use crate::utils::ids::create_id;

pub const FIRST_CHAT_TITLE: &str = "Chat 1";
pub const FIRST_CHAT_PREVIEW: &str = "New chat";
pub const FIRST_CHAT_GREETING: &str = "Hello! I'm running on your private Ollama instance.";
pub const NEW_CHAT_PREVIEW: &str = "New conversation started.";

fn payload_for(conversation: &Conversation) -> ConversationPayload {
    ConversationPayload {
        id: conversation.id.clone(),
        title: conversation.title.clone(),
        preview: Some(conversation.preview.clone()),
        timestamp: Some(conversation.timestamp.clone()),
    }
}

impl ChatApp {
    /// Populate the history list from the store and activate the newest
    /// conversation, creating the first one when the store is empty.
    pub async fn load_initial(&self) {
        let listed = match self.persister.store().list_conversations().await {
            Ok(conversations) => conversations,
            Err(err) => {
                warn!(error = %err, "failed to list conversations");
                Vec::new()
            }
        };

        let Some(first) = listed.first().cloned() else {
            self.create_first_conversation().await;
            return;
        };

        debug!(count = listed.len(), "loaded conversation history");
        self.session
            .update(|state| {
                state.reset_history(listed);
                state.activate(&first.id);
                self.emit(SessionEvent::ConversationActivated(first.id.clone()));
            })
            .await;
        self.load_messages(&first.id).await;
    }

    async fn create_first_conversation(&self) {
        let conversation = Conversation {
            id: create_id(),
            title: FIRST_CHAT_TITLE.to_string(),
            preview: FIRST_CHAT_PREVIEW.to_string(),
            timestamp: JUST_NOW.to_string(),
        };

        match self
            .persister
            .store()
            .save_conversation(&payload_for(&conversation))
            .await
        {
            Ok(()) => {
                info!(conversation_id = %conversation.id, "created first conversation");
                let greeting = Message::assistant(conversation.id.clone(), FIRST_CHAT_GREETING);
                self.session
                    .update(|state| {
                        state.reset_history(vec![conversation.clone()]);
                        state.replace_messages(&conversation.id, vec![greeting]);
                        state.activate(&conversation.id);
                        self.emit(SessionEvent::ConversationActivated(conversation.id.clone()));
                    })
                    .await;
            }
            Err(err) => {
                warn!(error = %err, "failed to create first conversation; using a local one");
                self.session
                    .update(|state| {
                        let seed = state.install_local_seed();
                        self.emit(SessionEvent::ConversationActivated(seed.id));
                    })
                    .await;
            }
        }
    }

    /// Make `conversation_id` active, loading its transcript if it has not
    /// been seen yet. Returns `false` when it was already active.
    pub async fn select_conversation(&self, conversation_id: &str) -> bool {
        let needs_load = self
            .session
            .update(|state| {
                if state.active_conversation_id == conversation_id {
                    return None;
                }
                state.activate(conversation_id);
                self.emit(SessionEvent::ConversationActivated(conversation_id.to_string()));
                Some(!state.is_cached(conversation_id))
            })
            .await;

        match needs_load {
            None => false,
            Some(true) => {
                self.load_messages(conversation_id).await;
                true
            }
            Some(false) => true,
        }
    }

    /// Fetch a transcript from the store. An empty transcript is shown as a
    /// single placeholder message, which is not persisted.
    pub async fn load_messages(&self, conversation_id: &str) {
        self.session
            .update(|state| state.is_loading_history = true)
            .await;

        let records = match self.persister.store().list_messages(conversation_id).await {
            Ok(records) => records,
            Err(err) => {
                warn!(conversation_id, error = %err, "failed to load messages");
                Vec::new()
            }
        };
        let loaded: Vec<Message> = records
            .into_iter()
            .filter_map(|record| record.into_message(conversation_id))
            .collect();
        debug!(conversation_id, count = loaded.len(), "loaded messages");

        self.session
            .update(|state| {
                let loaded = if loaded.is_empty() {
                    let conversation = state
                        .conversation(conversation_id)
                        .cloned()
                        .unwrap_or_else(|| Conversation {
                            id: conversation_id.to_string(),
                            title: UNTITLED_CHAT.to_string(),
                            preview: String::new(),
                            timestamp: String::new(),
                        });
                    vec![Message::placeholder(&conversation)]
                } else {
                    loaded
                };
                state.merge_loaded(conversation_id, loaded);
                state.is_loading_history = false;
            })
            .await;
    }

    /// Start `Chat N`, seed its greeting and activate it. A failed store
    /// create is logged; the conversation still exists locally.
    pub async fn new_conversation(&self) -> Conversation {
        let title = self.session.update(|state| state.next_chat_title()).await;
        let conversation = Conversation {
            id: create_id(),
            title,
            preview: NEW_CHAT_PREVIEW.to_string(),
            timestamp: JUST_NOW.to_string(),
        };

        if let Err(err) = self
            .persister
            .store()
            .save_conversation(&payload_for(&conversation))
            .await
        {
            warn!(title = %conversation.title, error = %err, "failed to create conversation");
        }

        let greeting = Message::assistant(conversation.id.clone(), NEW_CHAT_GREETING);
        self.persister.save_message(&greeting);
        self.session
            .update(|state| {
                state.prepend_conversation(conversation.clone());
                state.replace_messages(&conversation.id, vec![greeting]);
                state.activate(&conversation.id);
                self.emit(SessionEvent::ConversationActivated(conversation.id.clone()));
            })
            .await;
        info!(conversation_id = %conversation.id, title = %conversation.title, "started new conversation");
        conversation
    }
}
