use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::api::{ConversationPayload, MessageRecord};
use crate::core::message::Message;
use crate::core::store::ConversationStore;

/// Runs store writes as background tasks so the transcript never waits on
/// them. Failures are reported through `tracing` and counted.
#[derive(Clone)]
pub struct Persister {
    store: Arc<dyn ConversationStore>,
    tracker: TaskTracker,
    failures: Arc<AtomicUsize>,
}

impl Persister {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self {
            store,
            tracker: TaskTracker::new(),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    pub fn save_message(&self, message: &Message) {
        let record = MessageRecord::from_message(message);
        let store = Arc::clone(&self.store);
        let failures = Arc::clone(&self.failures);
        self.tracker.spawn(async move {
            match store.save_message(&record).await {
                Ok(()) => debug!(
                    message_id = %record.id,
                    conversation_id = %record.conversation_id,
                    "message saved"
                ),
                Err(err) => {
                    failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        message_id = %record.id,
                        conversation_id = %record.conversation_id,
                        error = %err,
                        "failed to save message"
                    );
                }
            }
        });
    }

    pub fn save_conversation(&self, payload: ConversationPayload) {
        let store = Arc::clone(&self.store);
        let failures = Arc::clone(&self.failures);
        self.tracker.spawn(async move {
            if let Err(err) = store.save_conversation(&payload).await {
                failures.fetch_add(1, Ordering::Relaxed);
                warn!(conversation_id = %payload.id, error = %err, "failed to save conversation");
            }
        });
    }

    /// Wait until every write spawned so far has finished.
    pub async fn flush(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}
