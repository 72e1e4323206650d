//! Activity routes — the swipe history review list and its undo buttons.
//!
//! The session ledger is served when it has entries; otherwise history is
//! reconstructed from persisted matches (bounded window) and cached into
//! the ledger. Undo is local-only: it never deletes persisted rows.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    routing::{delete, get},
    Json, Router,
};
use std::sync::Arc;

use atelier_common::error::{AtelierError, AtelierResult};
use atelier_engine::ledger::{self, SwipeEntry, SwipeLedger};

use crate::{middleware::AuthContext, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/activity", get(list_activity))
        .route("/activity/last", delete(undo_last))
        .route("/activity/{index}", delete(undo_at))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

/// GET /api/v1/activity — Newest first, like the review list renders it.
async fn list_activity(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> AtelierResult<Json<Vec<SwipeEntry>>> {
    {
        let sessions = state.sessions.read().await;
        if let Some(session) = sessions.get(&auth.user_id) {
            if !session.ledger.is_empty() {
                let mut newest_first = session.ledger.entries().to_vec();
                newest_first.reverse();
                return Ok(Json(newest_first));
            }
        }
    }

    // Cold session (fresh process or reload): rebuild from persisted matches.
    let window = atelier_common::config::get().limits.activity_window as i64;
    let entries = ledger::reconstruct(&state.db.pool, auth.user_id, window).await?;

    let mut sessions = state.sessions.write().await;
    let session = sessions.entry(auth.user_id).or_default();
    // Reconstruction is newest-first; the ledger stores chronological order.
    let mut chronological = entries.clone();
    chronological.reverse();
    session.ledger = SwipeLedger::from_entries(chronological);

    Ok(Json(entries))
}

/// DELETE /api/v1/activity/last — Undo the most recent swipe (local only).
async fn undo_last(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> AtelierResult<Json<SwipeEntry>> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.entry(auth.user_id).or_default();
    let entry = session
        .ledger
        .undo_last()
        .ok_or(AtelierError::NotFound { resource: "Swipe entry".into() })?;
    Ok(Json(entry))
}

/// DELETE /api/v1/activity/:index — Undo an arbitrary entry (local only).
/// The index addresses the list as GET /activity returns it (newest first).
async fn undo_at(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(index): Path<usize>,
) -> AtelierResult<Json<SwipeEntry>> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.entry(auth.user_id).or_default();
    let len = session.ledger.len();
    let entry = len
        .checked_sub(index + 1)
        .and_then(|ledger_index| session.ledger.undo_at(ledger_index))
        .ok_or(AtelierError::NotFound { resource: "Swipe entry".into() })?;
    Ok(Json(entry))
}
