//! Conversation repository.

use atelier_common::models::conversation::{Conversation, ConversationKind};
use atelier_common::models::row::encode_ts;
use chrono::{DateTime, Utc};
use sqlx::AnyPool;
use sqlx::{Any, Executor};
use uuid::Uuid;

/// Insert a conversation row. Generic over the executor so it can run inside
/// the match-bundle transaction or standalone.
pub async fn insert<'e, E>(executor: E, c: &Conversation) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Any>,
{
    sqlx::query(
        r#"
        INSERT INTO conversations (id, kind, match_id, team_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(c.id.to_string())
    .bind(c.kind.as_str())
    .bind(c.match_id.map(|m| m.to_string()))
    .bind(c.team_id.map(|t| t.to_string()))
    .bind(encode_ts(c.created_at))
    .bind(encode_ts(c.updated_at))
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &AnyPool, id: Uuid) -> Result<Option<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await
}

/// The direct conversation created alongside a match.
pub async fn find_by_match(
    pool: &AnyPool,
    match_id: Uuid,
) -> Result<Option<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE match_id = ?")
        .bind(match_id.to_string())
        .fetch_optional(pool)
        .await
}

/// A team's group conversation.
pub async fn find_team_conversation(
    pool: &AnyPool,
    team_id: Uuid,
) -> Result<Option<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        "SELECT * FROM conversations WHERE team_id = ? AND kind = ?",
    )
    .bind(team_id.to_string())
    .bind(ConversationKind::Team.as_str())
    .fetch_optional(pool)
    .await
}

/// Conversations the user participates in, most recently active first.
pub async fn list_for_user(pool: &AnyPool, user_id: Uuid) -> Result<Vec<Conversation>, sqlx::Error> {
    sqlx::query_as::<_, Conversation>(
        r#"
        SELECT c.* FROM conversations c
        INNER JOIN conversation_participants cp ON cp.conversation_id = c.id
        WHERE cp.user_id = ?
        ORDER BY c.updated_at DESC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await
}

/// Bump a conversation's activity timestamp (called on message insert).
pub async fn touch(pool: &AnyPool, id: Uuid, at: DateTime<Utc>) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
        .bind(encode_ts(at))
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete(pool: &AnyPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM conversations WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn exists(pool: &AnyPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM conversations WHERE id = ?")
        .bind(id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}
