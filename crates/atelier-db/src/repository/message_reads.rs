//! Read cursor repository — tracks where each user has read up to per
//! conversation.

use atelier_common::models::message::MessageRead;
use atelier_common::models::row::encode_ts;
use chrono::{DateTime, Utc};
use sqlx::AnyPool;
use uuid::Uuid;

/// Move the user's read cursor for a conversation.
pub async fn upsert(
    pool: &AnyPool,
    conversation_id: Uuid,
    user_id: Uuid,
    last_read_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO message_reads (conversation_id, user_id, last_read_at)
        VALUES (?, ?, ?)
        ON CONFLICT (conversation_id, user_id) DO UPDATE SET last_read_at = ?
        "#,
    )
    .bind(conversation_id.to_string())
    .bind(user_id.to_string())
    .bind(encode_ts(last_read_at))
    .bind(encode_ts(last_read_at))
    .execute(pool)
    .await?;
    Ok(())
}

/// The user's cursor for one conversation, if any.
pub async fn find(
    pool: &AnyPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<Option<MessageRead>, sqlx::Error> {
    sqlx::query_as::<_, MessageRead>(
        "SELECT * FROM message_reads WHERE conversation_id = ? AND user_id = ?",
    )
    .bind(conversation_id.to_string())
    .bind(user_id.to_string())
    .fetch_optional(pool)
    .await
}

/// Batch-fetch the user's cursors for a set of conversations. Conversations
/// with no cursor (never opened) are simply absent.
pub async fn find_many(
    pool: &AnyPool,
    conversation_ids: &[Uuid],
    user_id: Uuid,
) -> Result<Vec<MessageRead>, sqlx::Error> {
    if conversation_ids.is_empty() {
        return Ok(vec![]);
    }
    let placeholders = vec!["?"; conversation_ids.len()].join(", ");
    let sql = format!(
        "SELECT * FROM message_reads WHERE user_id = ? AND conversation_id IN ({placeholders})"
    );
    let mut query = sqlx::query_as::<_, MessageRead>(&sql);
    query = query.bind(user_id.to_string());
    for id in conversation_ids {
        query = query.bind(id.to_string());
    }
    query.fetch_all(pool).await
}
