//! Conversation routes — listing with unread counts, message history,
//! sending, and read acknowledgement.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use atelier_common::{
    error::{AtelierError, AtelierResult},
    event::EngineEvent,
    ids,
    models::message::{CreateMessageRequest, Message},
    validation::validate_request,
};
use atelier_db::repository::{conversations, messages, participants};
use atelier_engine::unread;

use crate::{middleware::AuthContext, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/conversations", get(list_conversations))
        .route(
            "/conversations/{conversation_id}/messages",
            get(list_messages).post(send_message),
        )
        .route("/conversations/{conversation_id}/ack", post(ack_conversation))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

async fn require_participant(
    state: &AppState,
    conversation_id: Uuid,
    user_id: Uuid,
) -> AtelierResult<()> {
    if !participants::is_participant(&state.db.pool, conversation_id, user_id).await? {
        // Participation doubles as visibility: outsiders see a 404
        return Err(AtelierError::NotFound { resource: "Conversation".into() });
    }
    Ok(())
}

/// GET /api/v1/conversations — The caller's conversations, most recently
/// active first, each with its unread count (one cursor query + one count
/// query per conversation).
async fn list_conversations(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> AtelierResult<Json<Vec<serde_json::Value>>> {
    let convs = conversations::list_for_user(&state.db.pool, auth.user_id).await?;
    let conversation_ids: Vec<Uuid> = convs.iter().map(|c| c.id).collect();
    let counts = unread::unread_counts(&state.db.pool, &conversation_ids, auth.user_id).await?;

    let mut results = Vec::with_capacity(convs.len());
    for conv in convs {
        let unread_count = counts.get(&conv.id).copied().unwrap_or(0);
        results.push(serde_json::json!({
            "id": conv.id,
            "kind": conv.kind,
            "match_id": conv.match_id,
            "team_id": conv.team_id,
            "unread": unread_count,
            "updated_at": conv.updated_at,
        }));
    }
    Ok(Json(results))
}

/// GET /api/v1/conversations/:conversation_id/messages
async fn list_messages(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
) -> AtelierResult<Json<Vec<Message>>> {
    require_participant(&state, conversation_id, auth.user_id).await?;
    let history = messages::list(&state.db.pool, conversation_id).await?;
    Ok(Json(history))
}

/// POST /api/v1/conversations/:conversation_id/messages
async fn send_message(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
    Json(body): Json<CreateMessageRequest>,
) -> AtelierResult<Json<Message>> {
    validate_request(&body)?;
    require_participant(&state, conversation_id, auth.user_id).await?;

    let message = Message {
        id: ids::generate_id(),
        conversation_id,
        sender_id: auth.user_id,
        content: body.content,
        created_at: Utc::now(),
    };
    messages::insert(&state.db.pool, &message).await?;
    conversations::touch(&state.db.pool, conversation_id, message.created_at).await?;

    let _ = state.events_tx.send(EngineEvent::message_create(
        conversation_id,
        serde_json::to_value(&message).map_err(anyhow::Error::from)?,
    ));

    Ok(Json(message))
}

/// POST /api/v1/conversations/:conversation_id/ack — Mark read. The cached
/// count is zeroed optimistically; a failed cursor upsert invalidates it so
/// the next list reconciles.
async fn ack_conversation(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(conversation_id): Path<Uuid>,
) -> AtelierResult<Json<serde_json::Value>> {
    require_participant(&state, conversation_id, auth.user_id).await?;

    let mut sessions = state.sessions.write().await;
    let user_session = sessions.entry(auth.user_id).or_default();
    user_session
        .unread
        .mark_read(&state.db.pool, conversation_id, auth.user_id)
        .await?;

    Ok(Json(serde_json::json!({ "read": true })))
}
