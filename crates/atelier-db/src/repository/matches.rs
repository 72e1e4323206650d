//! Match repository.
//!
//! `create_bundle` is the atomic "create match + conversation + participants"
//! procedure: one transaction, all-or-nothing. The engine prefers it and
//! falls back to the sequential inserts when a collaborator cannot provide
//! transactional writes.

use atelier_common::models::conversation::Conversation;
use atelier_common::models::matching::{MatchKind, MatchRecord, MatchStatus};
use atelier_common::models::row::encode_ts;
use chrono::{DateTime, Utc};
use sqlx::AnyPool;
use sqlx::{Any, Executor};
use uuid::Uuid;

/// Insert a match row. Generic over the executor so it can run inside the
/// bundle transaction or standalone.
pub async fn insert<'e, E>(executor: E, m: &MatchRecord) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Any>,
{
    sqlx::query(
        r#"
        INSERT INTO matches (
            id, user_id, target_user_id, team_id, kind, status, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(m.id.to_string())
    .bind(m.user_id.to_string())
    .bind(m.target_user_id.to_string())
    .bind(m.team_id.map(|t| t.to_string()))
    .bind(m.kind.as_str())
    .bind(m.status.as_str())
    .bind(encode_ts(m.created_at))
    .bind(encode_ts(m.updated_at))
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &AnyPool, id: Uuid) -> Result<Option<MatchRecord>, sqlx::Error> {
    sqlx::query_as::<_, MatchRecord>("SELECT * FROM matches WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

/// Flip a match's status, guarded on the expected current status.
/// Returns `false` if no row matched (missing, or concurrently transitioned).
pub async fn transition_status(
    pool: &AnyPool,
    id: Uuid,
    from: MatchStatus,
    to: MatchStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE matches SET status = ?, updated_at = ? WHERE id = ? AND status = ?",
    )
    .bind(to.as_str())
    .bind(encode_ts(Utc::now()))
    .bind(id.to_string())
    .bind(from.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Matches initiated by a user, newest first, bounded. ID is the tiebreaker
/// for rows created in the same microsecond.
pub async fn list_by_actor(
    pool: &AnyPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<MatchRecord>, sqlx::Error> {
    sqlx::query_as::<_, MatchRecord>(
        r#"
        SELECT * FROM matches
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Pending team→individual invites addressed to this user.
pub async fn list_pending_invites(
    pool: &AnyPool,
    user_id: Uuid,
) -> Result<Vec<MatchRecord>, sqlx::Error> {
    sqlx::query_as::<_, MatchRecord>(
        r#"
        SELECT * FROM matches
        WHERE target_user_id = ? AND kind = ? AND status = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id.to_string())
    .bind(MatchKind::TeamToIndividual.as_str())
    .bind(MatchStatus::Pending.as_str())
    .fetch_all(pool)
    .await
}

/// Pending individual→team join requests for a team.
pub async fn list_pending_join_requests(
    pool: &AnyPool,
    team_id: Uuid,
) -> Result<Vec<MatchRecord>, sqlx::Error> {
    sqlx::query_as::<_, MatchRecord>(
        r#"
        SELECT * FROM matches
        WHERE team_id = ? AND kind = ? AND status = ?
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(team_id.to_string())
    .bind(MatchKind::IndividualToTeam.as_str())
    .bind(MatchStatus::Pending.as_str())
    .fetch_all(pool)
    .await
}

/// Atomically create a match with its conversation and participant rows.
pub async fn create_bundle(
    pool: &AnyPool,
    m: &MatchRecord,
    conversation: &Conversation,
    participants: &[Uuid],
    joined_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    insert(&mut *tx, m).await?;
    super::conversations::insert(&mut *tx, conversation).await?;
    for &user_id in participants {
        super::participants::add(&mut *tx, conversation.id, user_id, joined_at).await?;
    }

    tx.commit().await
}
