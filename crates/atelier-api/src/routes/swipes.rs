//! Swipe routes — the discovery deck's gestures.
//!
//! A left swipe is a pure UI skip: it only appends to the session ledger.
//! A right swipe goes through the match factory and persists a match with
//! its conversation.

use axum::{extract::{Extension, State}, middleware, routing::post, Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use atelier_common::error::{AtelierError, AtelierResult};
use atelier_db::repository::{profiles, teams};
use atelier_engine::{
    create_match, factory, Session, SwipeDirection, SwipeSubject, SwipeTarget,
};

use crate::{middleware::AuthContext, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/swipes", post(swipe))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TargetKind {
    User,
    Team,
}

#[derive(Debug, Deserialize)]
struct SwipeRequest {
    target_type: TargetKind,
    target_id: Uuid,
    direction: SwipeDirection,
    /// Force the team-representative path. Fails with NO_TEAM when the
    /// caller has no team, before anything is written.
    #[serde(default)]
    as_team: bool,
}

/// POST /api/v1/swipes
async fn swipe(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<SwipeRequest>,
) -> AtelierResult<Json<serde_json::Value>> {
    let session = Session::resolve(&state.db.pool, auth.user_id).await?;

    let target = match body.target_type {
        TargetKind::User => {
            let profile = profiles::find_by_id(&state.db.pool, body.target_id)
                .await?
                .ok_or(AtelierError::NotFound { resource: "Profile".into() })?;
            SwipeTarget::Profile(profile)
        }
        TargetKind::Team => {
            let team = teams::find_by_id(&state.db.pool, body.target_id)
                .await?
                .ok_or(AtelierError::NotFound { resource: "Team".into() })?;
            SwipeTarget::Team(team)
        }
    };

    let subject = match &target {
        SwipeTarget::Profile(p) => SwipeSubject::Profile(p.clone()),
        SwipeTarget::Team(t) => SwipeSubject::Team(t.clone()),
    };

    match body.direction {
        SwipeDirection::Left => {
            let mut sessions = state.sessions.write().await;
            sessions.entry(auth.user_id).or_default().ledger.record_left(subject);
            Ok(Json(serde_json::json!({ "skipped": true })))
        }
        SwipeDirection::Right => {
            // The explicit team path is validated before any write.
            if body.as_team {
                match &target {
                    SwipeTarget::Profile(p) => {
                        factory::resolve_team_invite(&session, p.id)?;
                    }
                    SwipeTarget::Team(_) => {
                        return Err(AtelierError::Validation {
                            message: "Teams swipe on individuals, not on other teams".into(),
                        });
                    }
                }
            }

            let outcome = create_match(&state.db.pool, &session, &target, &state.events_tx).await?;

            let mut sessions = state.sessions.write().await;
            sessions
                .entry(auth.user_id)
                .or_default()
                .ledger
                .record_right(subject, outcome.match_id);

            Ok(Json(serde_json::json!({
                "match_id": outcome.match_id,
                "conversation_id": outcome.conversation_id,
            })))
        }
    }
}
