//! Profile routes — onboarding, discovery listing, self-edit.

use axum::{
    extract::{Extension, Path, State},
    middleware,
    routing::{get, patch},
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use atelier_common::{
    error::{AtelierError, AtelierResult},
    models::profile::{CreateProfileRequest, Profile, UpdateProfileRequest},
    validation::validate_request,
};
use atelier_db::repository::profiles;

use crate::{middleware::AuthContext, AppState};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/profiles", get(list_profiles).post(create_profile))
        .route("/profiles/@me", patch(update_my_profile))
        .route("/profiles/{user_id}", get(get_profile))
        .route_layer(middleware::from_fn(crate::middleware::auth_middleware))
}

/// POST /api/v1/profiles — Complete onboarding: create the caller's profile.
async fn create_profile(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateProfileRequest>,
) -> AtelierResult<Json<Profile>> {
    validate_request(&body)?;

    if profiles::find_by_id(&state.db.pool, auth.user_id).await?.is_some() {
        return Err(AtelierError::AlreadyExists { resource: "Profile".into() });
    }

    let now = Utc::now();
    let profile = Profile {
        id: auth.user_id,
        display_name: body.display_name,
        program: body.program,
        skills: body.skills,
        bio: body.bio,
        studio_preferences: body.studio_preferences,
        avatar_url: body.avatar_url,
        portfolio_url: body.portfolio_url,
        created_at: now,
        updated_at: now,
    };
    profiles::insert(&state.db.pool, &profile).await?;

    tracing::info!(user_id = %auth.user_id, "Profile created");

    Ok(Json(profile))
}

/// GET /api/v1/profiles — Discovery listing, excluding the caller.
async fn list_profiles(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
) -> AtelierResult<Json<Vec<Profile>>> {
    let all = profiles::list_excluding(&state.db.pool, auth.user_id).await?;
    Ok(Json(all))
}

/// GET /api/v1/profiles/:user_id
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> AtelierResult<Json<Profile>> {
    let profile = profiles::find_by_id(&state.db.pool, user_id)
        .await?
        .ok_or(AtelierError::NotFound { resource: "Profile".into() })?;
    Ok(Json(profile))
}

/// PATCH /api/v1/profiles/@me — Self-edit.
async fn update_my_profile(
    Extension(auth): Extension<AuthContext>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<UpdateProfileRequest>,
) -> AtelierResult<Json<Profile>> {
    validate_request(&body)?;

    profiles::find_by_id(&state.db.pool, auth.user_id)
        .await?
        .ok_or(AtelierError::NotFound { resource: "Profile".into() })?;

    profiles::update(
        &state.db.pool,
        auth.user_id,
        body.display_name.as_deref(),
        body.program.map(|p| p.as_str()),
        body.skills.as_deref(),
        body.bio.as_deref(),
        body.studio_preferences.as_deref(),
        body.avatar_url.as_deref(),
        body.portfolio_url.as_deref(),
    )
    .await?;

    let updated = profiles::find_by_id(&state.db.pool, auth.user_id)
        .await?
        .ok_or(AtelierError::NotFound { resource: "Profile".into() })?;
    Ok(Json(updated))
}
