//! # atelier-gateway
//!
//! Real-time WebSocket gateway for Atelier. Delivers the push half of the
//! messaging contract: new-message events for subscribed conversations and
//! match-lifecycle events addressed to the connected user.
//!
//! Subscriptions are scoped to the connection: subscribe when a
//! conversation view opens, unsubscribe when it closes, and everything is
//! torn down when the socket drops — on every exit path.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use atelier_common::event::EngineEvent;
use atelier_db::repository::participants;

/// Gateway state.
#[derive(Clone)]
pub struct GatewayState {
    /// Broadcast channel for dispatching engine events to all connections.
    pub events: broadcast::Sender<EngineEvent>,
    pub db: atelier_db::Database,
}

impl GatewayState {
    /// Create a GatewayState sharing the API's broadcast sender.
    pub fn with_events(db: atelier_db::Database, events: broadcast::Sender<EngineEvent>) -> Self {
        Self { events, db }
    }
}

/// Gateway opcodes — what the client and server send to each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", content = "d")]
pub enum GatewayMessage {
    /// Client → Server: Authenticate with access token
    Identify { token: String },

    /// Server → Client: Connection accepted
    Ready { user_id: String },

    /// Client → Server: Start receiving a conversation's messages
    Subscribe { conversation_id: String },

    /// Client → Server: Stop receiving a conversation's messages
    Unsubscribe { conversation_id: String },

    /// Bidirectional: Keepalive ping/pong
    Heartbeat { timestamp: i64 },

    /// Server → Client: Heartbeat acknowledged
    HeartbeatAck { timestamp: i64 },

    /// Server → Client: An event occurred
    Dispatch { event: String, data: serde_json::Value },

    /// Server → Client: Identify failed, close and retry with a fresh token
    InvalidSession,
}

/// Build the gateway WebSocket router.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/gateway", get(ws_handler))
        .with_state(Arc::new(state))
}

/// WebSocket upgrade handler.
async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<GatewayState>>) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

/// Handle a single WebSocket connection.
async fn handle_connection(socket: WebSocket, state: Arc<GatewayState>) {
    let (mut sender, mut receiver) = socket.split();

    // Direct-send channel: receive loop → sender task (Ready, HeartbeatAck)
    let (direct_tx, mut direct_rx) = tokio::sync::mpsc::channel::<GatewayMessage>(64);

    // Shared state touched by both the sender task and the receive loop
    let subscribed: Arc<RwLock<HashSet<Uuid>>> = Arc::new(RwLock::new(HashSet::new()));
    let authed_user_id: Arc<RwLock<Option<Uuid>>> = Arc::new(RwLock::new(None));

    // Subscribe to the broadcast before spawning so no event is missed
    let mut events_rx = state.events.subscribe();

    // ── Sender task ──────────────────────────────────────────────────────────
    // Merges filtered engine events and direct replies onto the socket.
    let subscribed_clone = subscribed.clone();
    let uid_clone = authed_user_id.clone();

    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                event = events_rx.recv() => {
                    let event = match event {
                        Ok(event) => event,
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Gateway connection lagged, resuming");
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    };

                    // Nothing is forwarded before Identify
                    let Some(uid) = *uid_clone.read().await else { continue };

                    let forward = match event.conversation_id {
                        Some(conversation_id) => {
                            subscribed_clone.read().await.contains(&conversation_id)
                        }
                        // Targeted events (match created, request resolved)
                        None => event.user_id == Some(uid),
                    };
                    if !forward {
                        continue;
                    }

                    let wire = GatewayMessage::Dispatch {
                        event: event.event_type,
                        data: event.data,
                    };
                    let Ok(text) = serde_json::to_string(&wire) else { continue };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Some(direct) = direct_rx.recv() => {
                    let Ok(text) = serde_json::to_string(&direct) else { continue };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                else => break,
            }
        }
    });

    // ── Receive loop ─────────────────────────────────────────────────────────
    let mut user_id: Option<Uuid> = None;

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                let Ok(gateway_msg) = serde_json::from_str::<GatewayMessage>(&text) else {
                    continue;
                };
                match gateway_msg {
                    GatewayMessage::Identify { token } => {
                        let config = atelier_common::config::get();
                        match atelier_common::auth::validate_token(&token, &config.auth.jwt_secret)
                        {
                            Ok(claims) => {
                                let Ok(uid) = claims.sub.parse::<Uuid>() else {
                                    continue;
                                };
                                user_id = Some(uid);
                                *authed_user_id.write().await = Some(uid);

                                let _ = direct_tx
                                    .send(GatewayMessage::Ready { user_id: uid.to_string() })
                                    .await;
                                tracing::info!(user_id = %uid, "Gateway READY sent");
                            }
                            Err(_) => {
                                let _ = direct_tx.send(GatewayMessage::InvalidSession).await;
                            }
                        }
                    }

                    GatewayMessage::Subscribe { conversation_id } => {
                        let Some(uid) = user_id else { continue };
                        let Ok(conversation_id) = conversation_id.parse::<Uuid>() else {
                            continue;
                        };
                        // Only participants may listen in
                        match participants::is_participant(&state.db.pool, conversation_id, uid)
                            .await
                        {
                            Ok(true) => {
                                subscribed.write().await.insert(conversation_id);
                            }
                            Ok(false) => {
                                tracing::debug!(
                                    user_id = %uid,
                                    conversation_id = %conversation_id,
                                    "Subscribe refused: not a participant"
                                );
                            }
                            Err(err) => {
                                tracing::warn!("Subscribe check failed: {err}");
                            }
                        }
                    }

                    GatewayMessage::Unsubscribe { conversation_id } => {
                        if let Ok(conversation_id) = conversation_id.parse::<Uuid>() {
                            subscribed.write().await.remove(&conversation_id);
                        }
                    }

                    GatewayMessage::Heartbeat { .. } => {
                        let _ = direct_tx
                            .send(GatewayMessage::HeartbeatAck {
                                timestamp: chrono::Utc::now().timestamp_millis(),
                            })
                            .await;
                    }

                    _ => {}
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    // ── Cleanup ──────────────────────────────────────────────────────────────
    // Dropping the broadcast receiver (inside the sender task) is the
    // unsubscribe; aborting here guarantees it on every exit path.
    send_task.abort();
    if let Some(uid) = user_id {
        tracing::info!(user_id = %uid, "Client disconnected from gateway");
    }
}
