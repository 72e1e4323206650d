//! Conversation models — messaging channels attached to matches and teams.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationKind {
    /// 1:1 negotiation channel created alongside a match
    Direct,
    /// Group channel with one participant per confirmed team member
    Team,
}

impl ConversationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Team => "team",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "direct" => Some(Self::Direct),
            "team" => Some(Self::Team),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub kind: ConversationKind,
    /// Set for direct conversations created alongside a match
    pub match_id: Option<Uuid>,
    /// Set for team group conversations
    pub team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::any::AnyRow> for Conversation {
    fn from_row(row: &'r sqlx::any::AnyRow) -> Result<Self, sqlx::Error> {
        use super::row::*;
        use sqlx::Row;
        let kind_raw: String = row.try_get("kind")?;
        Ok(Conversation {
            id: get_uuid(row, "id")?,
            kind: ConversationKind::parse(&kind_raw).ok_or_else(|| {
                sqlx::Error::Decode(format!("unknown conversation kind: {kind_raw}").into())
            })?,
            match_id: get_opt_uuid(row, "match_id")?,
            team_id: get_opt_uuid(row, "team_id")?,
            created_at: get_datetime(row, "created_at")?,
            updated_at: get_datetime(row, "updated_at")?,
        })
    }
}

/// Join entity: one row per (conversation, user), unique per pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationParticipant {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, sqlx::any::AnyRow> for ConversationParticipant {
    fn from_row(row: &'r sqlx::any::AnyRow) -> Result<Self, sqlx::Error> {
        use super::row::*;
        Ok(ConversationParticipant {
            conversation_id: get_uuid(row, "conversation_id")?,
            user_id: get_uuid(row, "user_id")?,
            joined_at: get_datetime(row, "joined_at")?,
        })
    }
}
