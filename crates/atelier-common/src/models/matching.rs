//! Match models — the central relationship record between swiping parties.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stored match kind. Determines which of {target user, team} plays the
/// "other side" role and who may accept/reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    IndividualToIndividual,
    TeamToIndividual,
    IndividualToTeam,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IndividualToIndividual => "individual_to_individual",
            Self::TeamToIndividual => "team_to_individual",
            Self::IndividualToTeam => "individual_to_team",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "individual_to_individual" => Some(Self::IndividualToIndividual),
            "team_to_individual" => Some(Self::TeamToIndividual),
            "individual_to_team" => Some(Self::IndividualToTeam),
            _ => None,
        }
    }

    /// Whether this kind is a join request with an accept/reject lifecycle.
    pub fn is_join_request(&self) -> bool {
        !matches!(self, Self::IndividualToIndividual)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Pending,
    Accepted,
    Rejected,
    /// Mutual-interest terminal state for individual↔individual matches.
    /// Nothing in the resolver writes it; it exists for stored-data parity.
    Matched,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Matched => "matched",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "rejected" => Some(Self::Rejected),
            "matched" => Some(Self::Matched),
            _ => None,
        }
    }
}

/// The shape of a match, carrying exactly the fields each variant needs.
///
/// Replaces stringly-typed dispatch on the stored kind: an
/// `individual_to_team` shape cannot exist without its team id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchShape {
    /// Two unaffiliated individuals signalling mutual interest.
    Mutual { actor_id: Uuid, target_user_id: Uuid },
    /// A team (represented by `actor_id`) inviting an individual.
    TeamInvite { team_id: Uuid, actor_id: Uuid, target_user_id: Uuid },
    /// An individual requesting to join a team; `owner_id` is the team
    /// owner, recorded as the match's primary contact.
    JoinRequest { actor_id: Uuid, team_id: Uuid, owner_id: Uuid },
}

impl MatchShape {
    pub fn kind(&self) -> MatchKind {
        match self {
            Self::Mutual { .. } => MatchKind::IndividualToIndividual,
            Self::TeamInvite { .. } => MatchKind::TeamToIndividual,
            Self::JoinRequest { .. } => MatchKind::IndividualToTeam,
        }
    }

    pub fn actor_id(&self) -> Uuid {
        match self {
            Self::Mutual { actor_id, .. }
            | Self::TeamInvite { actor_id, .. }
            | Self::JoinRequest { actor_id, .. } => *actor_id,
        }
    }

    /// The user recorded as `target_user_id` on the stored row.
    pub fn target_user_id(&self) -> Uuid {
        match self {
            Self::Mutual { target_user_id, .. } | Self::TeamInvite { target_user_id, .. } => {
                *target_user_id
            }
            Self::JoinRequest { owner_id, .. } => *owner_id,
        }
    }

    pub fn team_id(&self) -> Option<Uuid> {
        match self {
            Self::Mutual { .. } => None,
            Self::TeamInvite { team_id, .. } | Self::JoinRequest { team_id, .. } => Some(*team_id),
        }
    }

    /// The two conversation participants for this match's direct channel.
    pub fn participants(&self) -> [Uuid; 2] {
        [self.actor_id(), self.target_user_id()]
    }
}

/// A persisted match row. Shape fields are immutable after creation; only
/// `status` transitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: Uuid,
    /// Initiating user
    pub user_id: Uuid,
    /// The individual on the other side (team owner for join requests)
    pub target_user_id: Uuid,
    pub team_id: Option<Uuid>,
    pub kind: MatchKind,
    pub status: MatchStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MatchRecord {
    /// The individual who would join the team if this request is accepted.
    pub fn joining_user(&self) -> Uuid {
        match self.kind {
            // Team initiated: the invited individual is the target
            MatchKind::TeamToIndividual => self.target_user_id,
            // Individual initiated: the requester joins
            _ => self.user_id,
        }
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::any::AnyRow> for MatchRecord {
    fn from_row(row: &'r sqlx::any::AnyRow) -> Result<Self, sqlx::Error> {
        use super::row::*;
        use sqlx::Row;
        let kind_raw: String = row.try_get("kind")?;
        let status_raw: String = row.try_get("status")?;
        Ok(MatchRecord {
            id: get_uuid(row, "id")?,
            user_id: get_uuid(row, "user_id")?,
            target_user_id: get_uuid(row, "target_user_id")?,
            team_id: get_opt_uuid(row, "team_id")?,
            kind: MatchKind::parse(&kind_raw).ok_or_else(|| {
                sqlx::Error::Decode(format!("unknown match kind: {kind_raw}").into())
            })?,
            status: MatchStatus::parse(&status_raw).ok_or_else(|| {
                sqlx::Error::Decode(format!("unknown match status: {status_raw}").into())
            })?,
            created_at: get_datetime(row, "created_at")?,
            updated_at: get_datetime(row, "updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_kind_and_fields() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let t = Uuid::now_v7();

        let mutual = MatchShape::Mutual { actor_id: a, target_user_id: b };
        assert_eq!(mutual.kind(), MatchKind::IndividualToIndividual);
        assert_eq!(mutual.team_id(), None);
        assert_eq!(mutual.participants(), [a, b]);

        let invite = MatchShape::TeamInvite { team_id: t, actor_id: a, target_user_id: b };
        assert_eq!(invite.kind(), MatchKind::TeamToIndividual);
        assert_eq!(invite.team_id(), Some(t));

        let request = MatchShape::JoinRequest { actor_id: a, team_id: t, owner_id: b };
        assert_eq!(request.kind(), MatchKind::IndividualToTeam);
        // The team owner is the primary contact on the stored row
        assert_eq!(request.target_user_id(), b);
        assert_eq!(request.participants(), [a, b]);
    }

    #[test]
    fn joining_user_depends_on_initiator() {
        let now = chrono::Utc::now();
        let base = MatchRecord {
            id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            target_user_id: Uuid::now_v7(),
            team_id: Some(Uuid::now_v7()),
            kind: MatchKind::TeamToIndividual,
            status: MatchStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        // Team invited: the target individual joins
        assert_eq!(base.joining_user(), base.target_user_id);

        let request = MatchRecord { kind: MatchKind::IndividualToTeam, ..base.clone() };
        // Individual requested: the initiator joins
        assert_eq!(request.joining_user(), request.user_id);
    }
}
