//! Conversation participant repository.
//!
//! Like `team_members`, inserts go through `ON CONFLICT DO NOTHING` against
//! the (conversation_id, user_id) unique index so racing inserts collapse
//! into the idempotent "already present" outcome.

use atelier_common::models::conversation::ConversationParticipant;
use atelier_common::models::row::encode_ts;
use chrono::DateTime;
use chrono::Utc;
use sqlx::AnyPool;
use sqlx::{Any, Executor};
use uuid::Uuid;

/// Add a participant. Returns `true` if a row was actually inserted.
pub async fn add<'e, E>(
    executor: E,
    conversation_id: Uuid,
    user_id: Uuid,
    joined_at: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Any>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO conversation_participants (conversation_id, user_id, joined_at)
        VALUES (?, ?, ?)
        ON CONFLICT (conversation_id, user_id) DO NOTHING
        "#,
    )
    .bind(conversation_id.to_string())
    .bind(user_id.to_string())
    .bind(encode_ts(joined_at))
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn is_participant(
    pool: &AnyPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM conversation_participants WHERE conversation_id = ? AND user_id = ?",
    )
    .bind(conversation_id.to_string())
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// List a conversation's participants, oldest first.
pub async fn list(
    pool: &AnyPool,
    conversation_id: Uuid,
) -> Result<Vec<ConversationParticipant>, sqlx::Error> {
    sqlx::query_as::<_, ConversationParticipant>(
        "SELECT * FROM conversation_participants WHERE conversation_id = ? ORDER BY joined_at",
    )
    .bind(conversation_id.to_string())
    .fetch_all(pool)
    .await
}

/// Remove one participant (leaving a conversation).
pub async fn remove(
    pool: &AnyPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "DELETE FROM conversation_participants WHERE conversation_id = ? AND user_id = ?",
    )
    .bind(conversation_id.to_string())
    .bind(user_id.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

/// Remove all participants of a conversation (disband cascade).
pub async fn delete_by_conversation(
    pool: &AnyPool,
    conversation_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM conversation_participants WHERE conversation_id = ?")
        .bind(conversation_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
