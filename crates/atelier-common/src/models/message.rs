//! Message models — append-only conversation content plus read cursors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A message in a conversation. Never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::any::AnyRow> for Message {
    fn from_row(row: &'r sqlx::any::AnyRow) -> Result<Self, sqlx::Error> {
        use super::row::*;
        use sqlx::Row;
        Ok(Message {
            id: get_uuid(row, "id")?,
            conversation_id: get_uuid(row, "conversation_id")?,
            sender_id: get_uuid(row, "sender_id")?,
            content: row.try_get("content")?,
            created_at: get_datetime(row, "created_at")?,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateMessageRequest {
    #[validate(length(min = 1, max = 2000, message = "Message must be 1-2000 characters"))]
    pub content: String,
}

/// Per-(conversation, user) read cursor. Upserted when a conversation is
/// opened; absence means "never read".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRead {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub last_read_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::any::AnyRow> for MessageRead {
    fn from_row(row: &'r sqlx::any::AnyRow) -> Result<Self, sqlx::Error> {
        use super::row::*;
        Ok(MessageRead {
            conversation_id: get_uuid(row, "conversation_id")?,
            user_id: get_uuid(row, "user_id")?,
            last_read_at: get_datetime(row, "last_read_at")?,
        })
    }
}
