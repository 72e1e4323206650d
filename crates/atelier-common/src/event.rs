//! Engine event types — shared between the engine, API, and gateway crates.
//!
//! Mutating operations (match created, request accepted, message sent) emit
//! events on a broadcast channel and the gateway forwards them to connected
//! WebSocket clients. This module lives in `atelier-common` so every crate
//! can use it without circular deps.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events broadcast through the gateway to connected clients.
///
/// The engine and API create these when data mutates, and the gateway
/// forwards them to all connected clients whose subscriptions match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineEvent {
    /// Event type (e.g., "MATCH_CREATE", "MESSAGE_CREATE", "REQUEST_ACCEPT")
    pub event_type: String,
    /// Event payload as JSON
    pub data: serde_json::Value,
    /// Which conversation this event belongs to (for per-conversation subscriptions)
    pub conversation_id: Option<Uuid>,
    /// Which team this event belongs to
    pub team_id: Option<Uuid>,
    /// Which user this event is addressed to (targeted events)
    pub user_id: Option<Uuid>,
}

impl EngineEvent {
    /// A new message in a conversation.
    pub fn message_create(conversation_id: Uuid, data: serde_json::Value) -> Self {
        Self {
            event_type: "MESSAGE_CREATE".into(),
            data,
            conversation_id: Some(conversation_id),
            team_id: None,
            user_id: None,
        }
    }

    /// A match was created; addressed to the target side.
    pub fn match_create(target_user_id: Uuid, data: serde_json::Value) -> Self {
        Self {
            event_type: "MATCH_CREATE".into(),
            data,
            conversation_id: None,
            team_id: None,
            user_id: Some(target_user_id),
        }
    }

    /// A join request was resolved; addressed to the initiating side.
    pub fn request_resolved(accepted: bool, initiator_id: Uuid, data: serde_json::Value) -> Self {
        Self {
            event_type: if accepted { "REQUEST_ACCEPT" } else { "REQUEST_REJECT" }.into(),
            data,
            conversation_id: None,
            team_id: None,
            user_id: Some(initiator_id),
        }
    }
}
