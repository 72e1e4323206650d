//! Team routes — create, browse, manage, disband.

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
    ids,
    models::conversation::{Conversation, ConversationKind},
    models::member::{MemberRole, MemberStatus, TeamMember},
    models::team::{CreateTeamRequest, Team, UpdateTeamRequest},
    validation::validate_request,
};
use atelier_db::repository::{conversations, messages, participants, team_members, teams};

use crate::{middleware::AuthContext, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/teams", get(list_teams).post(create_team))
        .route("/teams/{team_id}", get(get_team).patch(update_team).delete(delete_team))
        .route("/teams/{team_id}/members", get(list_members))
        .route("/teams/{team_id}/leave", post(leave_team))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

/// POST /api/v1/teams — Create a team. The creator becomes its confirmed
/// admin and the team group conversation is opened with them in it.
async fn create_team(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTeamRequest>,
) -> AtelierResult<Json<Team>> {
    validate_request(&body)?;

    let now = Utc::now();
    let team = Team {
        id: ids::generate_id(),
        name: body.name,
        description: body.description,
        studio: body.studio,
        looking_for: body.looking_for,
        skills_needed: body.skills_needed,
        owner_id: auth.user_id,
        created_at: now,
        updated_at: now,
    };
    teams::insert(&state.db.pool, &team).await?;

    let admin = TeamMember {
        team_id: team.id,
        user_id: auth.user_id,
        role: MemberRole::Admin,
        status: MemberStatus::Confirmed,
        joined_at: now,
    };
    team_members::insert(&state.db.pool, &admin).await?;

    let conversation = Conversation {
        id: ids::generate_id(),
        kind: ConversationKind::Team,
        match_id: None,
        team_id: Some(team.id),
        created_at: now,
        updated_at: now,
    };
    conversations::insert(&state.db.pool, &conversation).await?;
    participants::add(&state.db.pool, conversation.id, auth.user_id, now).await?;

    tracing::info!(team_id = %team.id, owner = %auth.user_id, name = %team.name, "Team created");

    Ok(Json(team))
}

/// GET /api/v1/teams — Browse all teams.
async fn list_teams(State(state): State<Arc<AppState>>) -> AtelierResult<Json<Vec<Team>>> {
    Ok(Json(teams::list_all(&state.db.pool).await?))
}

/// GET /api/v1/teams/:team_id
async fn get_team(
    State(state): State<Arc<AppState>>,
    Path(team_id): Path<Uuid>,
) -> AtelierResult<Json<Team>> {
    let team = teams::find_by_id(&state.db.pool, team_id)
        .await?
        .ok_or(AtelierError::NotFound { resource: "Team".into() })?;
    Ok(Json(team))
}

/// PATCH /api/v1/teams/:team_id — Admin-only edit.
async fn update_team(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(team_id): Path<Uuid>,
    Json(body): Json<UpdateTeamRequest>,
) -> AtelierResult<Json<Team>> {
    validate_request(&body)?;

    teams::find_by_id(&state.db.pool, team_id)
        .await?
        .ok_or(AtelierError::NotFound { resource: "Team".into() })?;

    if !team_members::is_confirmed_admin(&state.db.pool, team_id, auth.user_id).await? {
        return Err(AtelierError::Forbidden);
    }

    teams::update(
        &state.db.pool,
        team_id,
        body.name.as_deref(),
        body.description.as_deref(),
        body.looking_for.as_deref(),
        body.skills_needed.as_deref(),
    )
    .await?;

    let updated = teams::find_by_id(&state.db.pool, team_id)
        .await?
        .ok_or(AtelierError::NotFound { resource: "Team".into() })?;
    Ok(Json(updated))
}

/// DELETE /api/v1/teams/:team_id — Disband. Owner only. Cascade order:
/// conversation participants → messages → conversation → members → team.
async fn delete_team(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(team_id): Path<Uuid>,
) -> AtelierResult<Json<serde_json::Value>> {
    let team = teams::find_by_id(&state.db.pool, team_id)
        .await?
        .ok_or(AtelierError::NotFound { resource: "Team".into() })?;

    if team.owner_id != auth.user_id {
        return Err(AtelierError::Forbidden);
    }

    if let Some(conversation) = conversations::find_team_conversation(&state.db.pool, team_id).await? {
        participants::delete_by_conversation(&state.db.pool, conversation.id).await?;
        messages::delete_by_conversation(&state.db.pool, conversation.id).await?;
        conversations::delete(&state.db.pool, conversation.id).await?;
    }
    team_members::delete_by_team(&state.db.pool, team_id).await?;
    teams::delete(&state.db.pool, team_id).await?;

    tracing::info!(team_id = %team_id, "Team disbanded");

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// GET /api/v1/teams/:team_id/members
async fn list_members(
    State(state): State<Arc<AppState>>,
    Path(team_id): Path<Uuid>,
) -> AtelierResult<Json<Vec<TeamMember>>> {
    Ok(Json(team_members::list_confirmed(&state.db.pool, team_id).await?))
}

/// POST /api/v1/teams/:team_id/leave — Leave a team. The owner must
/// disband (or transfer) instead.
async fn leave_team(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Path(team_id): Path<Uuid>,
) -> AtelierResult<Json<serde_json::Value>> {
    let team = teams::find_by_id(&state.db.pool, team_id)
        .await?
        .ok_or(AtelierError::NotFound { resource: "Team".into() })?;

    if team.owner_id == auth.user_id {
        return Err(AtelierError::Validation {
            message: "The owner cannot leave; disband the team instead".into(),
        });
    }

    team_members::find_confirmed(&state.db.pool, team_id, auth.user_id)
        .await?
        .ok_or(AtelierError::NotFound { resource: "Membership".into() })?;

    team_members::delete(&state.db.pool, team_id, auth.user_id).await?;
    if let Some(conversation) = conversations::find_team_conversation(&state.db.pool, team_id).await? {
        participants::remove(&state.db.pool, conversation.id, auth.user_id).await?;
    }

    tracing::info!(team_id = %team_id, user_id = %auth.user_id, "Member left team");

    Ok(Json(serde_json::json!({ "left": true })))
}
