//! Per-request session — who is acting, and for which team.
//!
//! Resolved once at the edge (auth middleware) and passed explicitly into
//! every engine operation, so the engine has no hidden coupling to request
//! state and is directly testable.

use sqlx::AnyPool;
use uuid::Uuid;

use atelier_db::repository::team_members;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    /// The user's current confirmed team, if any. Disambiguates whether a
    /// right-swipe on a profile is an individual signal or a team invite.
    pub team_id: Option<Uuid>,
}

impl Session {
    pub fn solo(user_id: Uuid) -> Self {
        Self { user_id, team_id: None }
    }

    pub fn with_team(user_id: Uuid, team_id: Uuid) -> Self {
        Self { user_id, team_id: Some(team_id) }
    }

    /// Resolve a session from persisted membership: the user's most recent
    /// confirmed team, if any.
    pub async fn resolve(pool: &AnyPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        let membership = team_members::find_current_for_user(pool, user_id).await?;
        Ok(Self {
            user_id,
            team_id: membership.map(|m| m.team_id),
        })
    }
}
