//! Conversation feed — the open conversation's message list, merged from a
//! repository read plus pushed realtime messages.
//!
//! Pushed and fetched messages can overlap (the send round-trip races the
//! broadcast delivery), so merging is idempotent on message id.

use tokio::sync::broadcast;
use uuid::Uuid;

use atelier_common::event::EngineEvent;
use atelier_common::models::message::Message;

/// Ordered message list for one open conversation.
#[derive(Debug)]
pub struct ConversationFeed {
    conversation_id: Uuid,
    messages: Vec<Message>,
}

impl ConversationFeed {
    /// Seed a feed from a repository read (already in chronological order).
    pub fn from_history(conversation_id: Uuid, messages: Vec<Message>) -> Self {
        Self { conversation_id, messages }
    }

    /// Merge one message, keeping (created_at, id) order. Returns `false`
    /// and changes nothing when the id is already present.
    pub fn merge(&mut self, message: Message) -> bool {
        if message.conversation_id != self.conversation_id {
            return false;
        }
        if self.messages.iter().any(|m| m.id == message.id) {
            return false;
        }
        let key = (message.created_at, message.id);
        let pos = self
            .messages
            .partition_point(|m| (m.created_at, m.id) <= key);
        self.messages.insert(pos, message);
        true
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Scoped subscription to one conversation's pushed messages.
///
/// Created when the conversation view opens; dropping it (on close, error,
/// or unmount) releases the broadcast receiver — unsubscribe is guaranteed
/// on every exit path.
pub struct FeedSubscription {
    conversation_id: Uuid,
    rx: broadcast::Receiver<EngineEvent>,
}

impl FeedSubscription {
    pub fn new(conversation_id: Uuid, events: &broadcast::Sender<EngineEvent>) -> Self {
        Self { conversation_id, rx: events.subscribe() }
    }

    /// Wait for the next message pushed into this conversation. Other
    /// events are skipped. A lagged receiver logs and keeps going — the
    /// caller reconciles gaps from the repository on its next read.
    pub async fn next_message(&mut self) -> Option<Message> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if event.event_type != "MESSAGE_CREATE"
                        || event.conversation_id != Some(self.conversation_id)
                    {
                        continue;
                    }
                    match serde_json::from_value::<Message>(event.data) {
                        Ok(message) => return Some(message),
                        Err(err) => {
                            tracing::warn!("Dropping undecodable pushed message: {err}");
                            continue;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(
                        conversation_id = %self.conversation_id,
                        skipped,
                        "Feed subscription lagged, continuing"
                    );
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
