use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{ChatApp, SessionEvent};
use crate::api::{ChatMessage, ChatRequest};
use crate::core::chat_stream::StreamError;
use crate::core::message::{Attachment, Message, ATTACHMENT_ONLY_TEXT};
use crate::core::reducer::StreamReducer;
use crate::core::transport::LineReader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Blank text and nothing attached.
    Empty,
    /// The active conversation is still generating.
    Busy,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Ignored(IgnoreReason),
    Completed {
        conversation_id: String,
        message_id: String,
        content: String,
    },
    Failed {
        conversation_id: String,
        error: StreamError,
    },
}

impl SubmitOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, SubmitOutcome::Ignored(_))
    }
}

struct PreparedTurn {
    conversation_id: String,
    history: Vec<ChatMessage>,
    model: String,
}

impl ChatApp {
    /// Send `text` plus `attachments` in the active conversation and stream
    /// the reply to completion.
    pub async fn submit(&self, text: &str, attachments: Vec<Attachment>) -> SubmitOutcome {
        let prepared = self
            .session
            .update(|state| {
                let trimmed = text.trim();
                if trimmed.is_empty() && attachments.is_empty() {
                    return Err(IgnoreReason::Empty);
                }
                let conversation_id = state.active_conversation_id.clone();
                if !state.begin_generation(&conversation_id) {
                    return Err(IgnoreReason::Busy);
                }

                let content = if trimmed.is_empty() {
                    ATTACHMENT_ONLY_TEXT
                } else {
                    trimmed
                };
                let user = Message::user(conversation_id.clone(), content)
                    .with_attachments(attachments);
                self.emit(SessionEvent::MessageAppended {
                    conversation_id: conversation_id.clone(),
                    message_id: user.id.clone(),
                });
                state.push_message(user.clone());
                state.refresh_history_preview(&conversation_id, content, None);
                state.clear_composer();

                Ok((
                    user,
                    PreparedTurn {
                        history: state.chat_history(&conversation_id),
                        model: state.selected_model.clone(),
                        conversation_id,
                    },
                ))
            })
            .await;

        let (user, turn) = match prepared {
            Ok(prepared) => prepared,
            Err(reason) => {
                debug!(?reason, "submit ignored");
                return SubmitOutcome::Ignored(reason);
            }
        };

        self.persister.save_message(&user);
        self.run_turn(turn).await
    }

    /// Submit whatever is in the composer.
    pub async fn submit_composer(&self) -> SubmitOutcome {
        let (text, attachments) = self
            .session
            .read(|state| (state.composer.clone(), state.attachments.clone()))
            .await;
        self.submit(&text, attachments).await
    }

    /// Run [`ChatApp::submit`] in the background.
    pub fn spawn_submit(&self, text: String, attachments: Vec<Attachment>) -> JoinHandle<SubmitOutcome> {
        let app = self.clone();
        tokio::spawn(async move { app.submit(&text, attachments).await })
    }

    async fn run_turn(&self, turn: PreparedTurn) -> SubmitOutcome {
        let PreparedTurn {
            conversation_id,
            history,
            model,
        } = turn;
        let request = ChatRequest {
            model,
            messages: history,
            stream: true,
        };

        let mut streaming_id = None;
        let result = self
            .stream_reply(&conversation_id, &request, &mut streaming_id)
            .await;

        let outcome = match result {
            Ok(message) => {
                info!(
                    conversation_id = %conversation_id,
                    message_id = %message.id,
                    chars = message.content.len(),
                    "assistant reply complete"
                );
                self.persister.save_message(&message);
                self.session
                    .update(|state| {
                        state.refresh_history_preview(&conversation_id, &message.content, None)
                    })
                    .await;
                SubmitOutcome::Completed {
                    conversation_id: conversation_id.clone(),
                    message_id: message.id,
                    content: message.content,
                }
            }
            Err(error) => {
                warn!(conversation_id = %conversation_id, error = %error, "chat request failed");
                let failure = self
                    .session
                    .update(|state| {
                        let failure =
                            state.replace_with_failure(&conversation_id, streaming_id.as_deref());
                        if streaming_id.as_deref() == Some(failure.id.as_str()) {
                            self.emit(SessionEvent::MessageUpdated {
                                conversation_id: conversation_id.clone(),
                                message_id: failure.id.clone(),
                                content: failure.content.clone(),
                            });
                        } else {
                            self.emit(SessionEvent::MessageAppended {
                                conversation_id: conversation_id.clone(),
                                message_id: failure.id.clone(),
                            });
                        }
                        failure
                    })
                    .await;
                self.persister.save_message(&failure);
                SubmitOutcome::Failed {
                    conversation_id: conversation_id.clone(),
                    error,
                }
            }
        };

        let failed = matches!(outcome, SubmitOutcome::Failed { .. });
        self.session
            .update(|state| {
                state.finish_generation(&conversation_id);
                self.emit(SessionEvent::GenerationFinished {
                    conversation_id: conversation_id.clone(),
                    failed,
                });
            })
            .await;
        outcome
    }

    /// Open the stream and fold it into one assistant message.
    /// `streaming_id` is set once that message exists.
    async fn stream_reply(
        &self,
        conversation_id: &str,
        request: &ChatRequest,
        streaming_id: &mut Option<String>,
    ) -> Result<Message, StreamError> {
        let body = self.transport.open_stream(request).await?;

        let reply = Message::assistant(conversation_id, "");
        let message_id = reply.id.clone();
        *streaming_id = Some(message_id.clone());
        self.session
            .update(|state| {
                state.push_message(reply);
                state.set_streaming_message(conversation_id, &message_id);
                self.emit(SessionEvent::MessageAppended {
                    conversation_id: conversation_id.to_string(),
                    message_id: message_id.clone(),
                });
            })
            .await;

        let mut reducer = StreamReducer::new(message_id.clone());
        let mut reader = LineReader::new(body);
        while let Some(line) = reader.next_line().await? {
            let Some(snapshot) = reducer.apply_line(&line) else {
                continue;
            };
            let snapshot = snapshot.to_string();
            self.session
                .update(|state| {
                    if state.set_message_content(conversation_id, &message_id, &snapshot) {
                        self.emit(SessionEvent::MessageUpdated {
                            conversation_id: conversation_id.to_string(),
                            message_id: message_id.clone(),
                            content: snapshot,
                        });
                    }
                })
                .await;
        }

        let content = reducer.into_content();
        let message = self
            .session
            .read(|state| state.find_message(conversation_id, &message_id).cloned())
            .await
            .unwrap_or_else(|| {
                let mut message = Message::assistant(conversation_id, content);
                message.id = message_id.clone();
                message
            });
        Ok(message)
    }
}
