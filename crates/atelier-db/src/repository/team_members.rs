//! Team membership repository.
//!
//! Inserts use `ON CONFLICT DO NOTHING` against the (team_id, user_id)
//! unique index: under a read-check/insert race the loser's insert is a
//! no-op, which the engine treats as the idempotent "already a member"
//! outcome.

use atelier_common::models::member::{MemberRole, MemberStatus, TeamMember};
use atelier_common::models::row::encode_ts;
use sqlx::AnyPool;
use uuid::Uuid;

/// Insert a membership row. Returns `true` if a row was actually inserted,
/// `false` if the (team, user) pair already existed.
pub async fn insert(pool: &AnyPool, member: &TeamMember) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO team_members (team_id, user_id, role, status, joined_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (team_id, user_id) DO NOTHING
        "#,
    )
    .bind(member.team_id.to_string())
    .bind(member.user_id.to_string())
    .bind(member.role.as_str())
    .bind(member.status.as_str())
    .bind(encode_ts(member.joined_at))
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Find a confirmed membership for the (team, user) pair.
pub async fn find_confirmed(
    pool: &AnyPool,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<Option<TeamMember>, sqlx::Error> {
    sqlx::query_as::<_, TeamMember>(
        "SELECT * FROM team_members WHERE team_id = ? AND user_id = ? AND status = ?",
    )
    .bind(team_id.to_string())
    .bind(user_id.to_string())
    .bind(MemberStatus::Confirmed.as_str())
    .fetch_optional(pool)
    .await
}

/// The user's current confirmed membership, if any. Most recent wins when
/// stale rows from disbanded teams linger.
pub async fn find_current_for_user(
    pool: &AnyPool,
    user_id: Uuid,
) -> Result<Option<TeamMember>, sqlx::Error> {
    sqlx::query_as::<_, TeamMember>(
        r#"
        SELECT * FROM team_members
        WHERE user_id = ? AND status = ?
        ORDER BY joined_at DESC
        LIMIT 1
        "#,
    )
    .bind(user_id.to_string())
    .bind(MemberStatus::Confirmed.as_str())
    .fetch_optional(pool)
    .await
}

/// List confirmed members of a team, oldest first.
pub async fn list_confirmed(pool: &AnyPool, team_id: Uuid) -> Result<Vec<TeamMember>, sqlx::Error> {
    sqlx::query_as::<_, TeamMember>(
        "SELECT * FROM team_members WHERE team_id = ? AND status = ? ORDER BY joined_at",
    )
    .bind(team_id.to_string())
    .bind(MemberStatus::Confirmed.as_str())
    .fetch_all(pool)
    .await
}

/// Whether the user is a confirmed admin of the team.
pub async fn is_confirmed_admin(
    pool: &AnyPool,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*) FROM team_members
        WHERE team_id = ? AND user_id = ? AND status = ? AND role = ?
        "#,
    )
    .bind(team_id.to_string())
    .bind(user_id.to_string())
    .bind(MemberStatus::Confirmed.as_str())
    .bind(MemberRole::Admin.as_str())
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Change a member's role.
pub async fn update_role(
    pool: &AnyPool,
    team_id: Uuid,
    user_id: Uuid,
    role: MemberRole,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE team_members SET role = ? WHERE team_id = ? AND user_id = ?")
        .bind(role.as_str())
        .bind(team_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove one member (leave / kick).
pub async fn delete(pool: &AnyPool, team_id: Uuid, user_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM team_members WHERE team_id = ? AND user_id = ?")
        .bind(team_id.to_string())
        .bind(user_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

/// Remove all members of a team (disband cascade).
pub async fn delete_by_team(pool: &AnyPool, team_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM team_members WHERE team_id = ?")
        .bind(team_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
