//! Team member model — a user's membership in a specific team.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Member,
    Admin,
}

impl MemberRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

/// Membership status. Only `confirmed` rows count toward the
/// one-row-per-(team, user) invariant; `invited` is transitional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Confirmed,
    Invited,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Invited => "invited",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "confirmed" => Some(Self::Confirmed),
            "invited" => Some(Self::Invited),
            _ => None,
        }
    }
}

/// Represents a user's membership in a team.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub joined_at: DateTime<Utc>,
}

impl TeamMember {
    pub fn is_confirmed_admin(&self) -> bool {
        self.status == MemberStatus::Confirmed && self.role == MemberRole::Admin
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::any::AnyRow> for TeamMember {
    fn from_row(row: &'r sqlx::any::AnyRow) -> Result<Self, sqlx::Error> {
        use super::row::*;
        use sqlx::Row;
        let role_raw: String = row.try_get("role")?;
        let status_raw: String = row.try_get("status")?;
        Ok(TeamMember {
            team_id: get_uuid(row, "team_id")?,
            user_id: get_uuid(row, "user_id")?,
            role: MemberRole::parse(&role_raw)
                .ok_or_else(|| sqlx::Error::Decode(format!("unknown role: {role_raw}").into()))?,
            status: MemberStatus::parse(&status_raw).ok_or_else(|| {
                sqlx::Error::Decode(format!("unknown member status: {status_raw}").into())
            })?,
            joined_at: get_datetime(row, "joined_at")?,
        })
    }
}
