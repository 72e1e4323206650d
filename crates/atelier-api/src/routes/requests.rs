//! Join-request routes — list pending requests addressed to the caller and
//! resolve them.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use uuid::Uuid;

use atelier_common::error::AtelierResult;
use atelier_common::models::matching::MatchRecord;
use atelier_db::repository::{matches, team_members};
use atelier_engine::{resolver, Session};

use crate::{middleware::AuthContext, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/requests", get(list_requests))
        .route("/requests/{match_id}/accept", post(accept_request))
        .route("/requests/{match_id}/reject", post(reject_request))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

/// GET /api/v1/requests — Pending requests the caller can act on: team
/// invites addressed to them, plus join requests for their team when they
/// are a confirmed admin.
async fn list_requests(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> AtelierResult<Json<Vec<MatchRecord>>> {
    let mut pending = matches::list_pending_invites(&state.db.pool, auth.user_id).await?;

    let session = Session::resolve(&state.db.pool, auth.user_id).await?;
    if let Some(team_id) = session.team_id {
        if team_members::is_confirmed_admin(&state.db.pool, team_id, auth.user_id).await? {
            pending.extend(matches::list_pending_join_requests(&state.db.pool, team_id).await?);
        }
    }

    Ok(Json(pending))
}

/// POST /api/v1/requests/:match_id/accept
async fn accept_request(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AtelierResult<Json<serde_json::Value>> {
    let outcome =
        resolver::accept(&state.db.pool, auth.user_id, match_id, &state.events_tx).await?;

    Ok(Json(serde_json::json!({
        "match_id": outcome.match_id,
        "team_id": outcome.team_id,
        "user_added": outcome.user_added,
        "already_member": outcome.already_member,
    })))
}

/// POST /api/v1/requests/:match_id/reject
async fn reject_request(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(match_id): Path<Uuid>,
) -> AtelierResult<Json<serde_json::Value>> {
    resolver::reject(&state.db.pool, auth.user_id, match_id, &state.events_tx).await?;
    Ok(Json(serde_json::json!({ "rejected": true })))
}
