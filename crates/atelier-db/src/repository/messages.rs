//! Message repository. Messages are append-only; there is no update or
//! single-row delete, only the team-disband cascade.

use atelier_common::models::message::Message;
use atelier_common::models::row::encode_ts;
use chrono::{DateTime, Utc};
use sqlx::AnyPool;
use uuid::Uuid;

pub async fn insert(pool: &AnyPool, msg: &Message) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO messages (id, conversation_id, sender_id, content, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(msg.id.to_string())
    .bind(msg.conversation_id.to_string())
    .bind(msg.sender_id.to_string())
    .bind(&msg.content)
    .bind(encode_ts(msg.created_at))
    .execute(pool)
    .await?;
    Ok(())
}

/// List a conversation's messages in chronological order.
pub async fn list(pool: &AnyPool, conversation_id: Uuid) -> Result<Vec<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT * FROM messages
        WHERE conversation_id = ?
        ORDER BY created_at, id
        "#,
    )
    .bind(conversation_id.to_string())
    .fetch_all(pool)
    .await
}

/// Count messages another party sent after the given cursor. A `None`
/// cursor means "never read" — every message from another sender counts.
pub async fn count_unread_since(
    pool: &AnyPool,
    conversation_id: Uuid,
    user_id: Uuid,
    after: Option<DateTime<Utc>>,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = match after {
        Some(cursor) => {
            sqlx::query_as(
                r#"
                SELECT COUNT(*) FROM messages
                WHERE conversation_id = ? AND sender_id <> ? AND created_at > ?
                "#,
            )
            .bind(conversation_id.to_string())
            .bind(user_id.to_string())
            .bind(encode_ts(cursor))
            .fetch_one(pool)
            .await?
        }
        None => {
            sqlx::query_as(
                "SELECT COUNT(*) FROM messages WHERE conversation_id = ? AND sender_id <> ?",
            )
            .bind(conversation_id.to_string())
            .bind(user_id.to_string())
            .fetch_one(pool)
            .await?
        }
    };
    Ok(count)
}

/// Remove all of a conversation's messages (disband cascade).
pub async fn delete_by_conversation(
    pool: &AnyPool,
    conversation_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM messages WHERE conversation_id = ?")
        .bind(conversation_id.to_string())
        .execute(pool)
        .await?;
    Ok(())
}
