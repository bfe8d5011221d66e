use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::models::{pick_model, DEFAULT_MODEL};
use crate::core::attachments::{decode_preview, SelectedFile};
use crate::core::chat_stream::ChatTransport;
use crate::core::message::{Attachment, Message, Reaction};
use crate::core::persist::Persister;
use crate::core::store::ConversationStore;
use crate::utils::clipboard::Clipboard;

pub mod conversation;
pub mod session;
pub mod streaming;


pub use session::SessionState;
pub use streaming::{IgnoreReason, SubmitOutcome};

/// How long the "copied" indicator stays on a message.
pub const COPIED_INDICATOR_DURATION: Duration = Duration::from_secs(2);

/// Notifications for whatever renders the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    MessageAppended {
        conversation_id: String,
        message_id: String,
    },
    MessageUpdated {
        conversation_id: String,
        message_id: String,
        content: String,
    },
    GenerationFinished {
        conversation_id: String,
        failed: bool,
    },
    CopiedChanged(Option<String>),
    ConversationActivated(String),
}

/// Shared, serialized access to [`SessionState`].
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionHandle {
    pub fn new(state: SessionState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    /// Run `f` with exclusive access to the state.
    pub async fn update<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        let mut guard = self.inner.lock().await;
        f(&mut guard)
    }

    pub async fn read<R>(&self, f: impl FnOnce(&SessionState) -> R) -> R {
        let guard = self.inner.lock().await;
        f(&guard)
    }
}

/// Session controller: owns the state handle and its collaborators.
#[derive(Clone)]
pub struct ChatApp {
    session: SessionHandle,
    persister: Persister,
    transport: Arc<dyn ChatTransport>,
    clipboard: Arc<dyn Clipboard>,
    events: UnboundedSender<SessionEvent>,
}

impl ChatApp {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        transport: Arc<dyn ChatTransport>,
        clipboard: Arc<dyn Clipboard>,
        default_model: impl Into<String>,
    ) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let app = Self {
            session: SessionHandle::new(SessionState::new(default_model)),
            persister: Persister::new(store),
            transport,
            clipboard,
            events,
        };
        (app, rx)
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn persister(&self) -> &Persister {
        &self.persister
    }

    /// Copy of the whole state, for rendering and tests.
    pub async fn snapshot(&self) -> SessionState {
        self.session.read(|state| state.clone()).await
    }

    pub async fn active_messages(&self) -> Vec<Message> {
        self.session.read(|state| state.active_messages().to_vec()).await
    }

    pub async fn is_generating(&self) -> bool {
        self.session.read(SessionState::is_generating).await
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // A dropped receiver just means nobody is rendering.
        let _ = self.events.send(event);
    }

    pub async fn set_composer(&self, text: impl Into<String>) {
        let text = text.into();
        self.session.update(|state| state.composer = text).await;
    }

    pub async fn toggle_reaction(&self, message_id: &str, kind: Reaction) -> Option<Reaction> {
        self.session
            .update(|state| state.toggle_reaction(message_id, kind))
            .await
            .flatten()
    }

    /// Copy a message of the active conversation to the clipboard and flag
    /// it as copied for [`COPIED_INDICATOR_DURATION`].
    pub async fn copy_message(&self, message_id: &str) -> bool {
        let content = self
            .session
            .read(|state| {
                state
                    .find_message(&state.active_conversation_id, message_id)
                    .map(|m| m.content.clone())
            })
            .await;
        let Some(content) = content else {
            debug!(message_id, "copy requested for unknown message");
            return false;
        };

        if let Err(err) = self.clipboard.write_text(&content).await {
            warn!(message_id, error = %err, "failed to copy message");
            self.session
                .update(|state| {
                    state.copied_message_id = None;
                    self.emit(SessionEvent::CopiedChanged(None));
                })
                .await;
            return false;
        }

        let copied = message_id.to_string();
        self.session
            .update(|state| {
                state.copied_message_id = Some(copied.clone());
                self.emit(SessionEvent::CopiedChanged(Some(copied.clone())));
            })
            .await;

        let app = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(COPIED_INDICATOR_DURATION).await;
            app.session
                .update(|state| {
                    if state.copied_message_id.as_deref() == Some(copied.as_str()) {
                        state.copied_message_id = None;
                        app.emit(SessionEvent::CopiedChanged(None));
                    }
                })
                .await;
        });
        true
    }

    /// Stage image files on the composer. Non-image files are skipped.
    /// Returns the attachments that were added.
    pub async fn stage_files(&self, files: Vec<SelectedFile>) -> Vec<Attachment> {
        let mut staged = Vec::new();
        for file in files {
            if !file.is_image() {
                debug!(mime_type = %file.mime_type, "ignoring non-image attachment");
                continue;
            }
            let count = self.session.read(|state| state.attachments.len()).await;
            let name = file.name.clone();
            let attachment = match decode_preview(file, count).await {
                Ok(attachment) => attachment,
                Err(err) => {
                    warn!(name = ?name, error = %err, "failed to encode attachment preview");
                    continue;
                }
            };
            self.session
                .update(|state| state.stage_attachment(attachment.clone()))
                .await;
            staged.push(attachment);
        }
        staged
    }

    pub async fn remove_attachment(&self, attachment_id: &str) -> bool {
        self.session
            .update(|state| state.remove_attachment(attachment_id))
            .await
    }

    pub async fn clear_attachments(&self) {
        self.session.update(|state| state.attachments.clear()).await;
    }

    pub async fn select_model(&self, model: impl Into<String>) {
        let model = model.into();
        self.session.update(|state| state.selected_model = model).await;
    }

    /// Reload the model list, keeping the selection when it is still
    /// served. Falls back to the default model when listing fails.
    pub async fn refresh_models(&self) -> Vec<String> {
        let models = match self.transport.list_models().await {
            Ok(models) if !models.is_empty() => models,
            Ok(_) => vec![DEFAULT_MODEL.to_string()],
            Err(err) => {
                warn!(error = %err, "failed to list models");
                vec![DEFAULT_MODEL.to_string()]
            }
        };
        self.session
            .update(|state| {
                state.selected_model = pick_model(&models, &state.selected_model);
                state.models = models.clone();
            })
            .await;
        models
    }
}
