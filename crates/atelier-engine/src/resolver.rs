//! Join-request resolver — owns the match status state machine for
//! team-involving match kinds and its side effects.
//!
//! Acceptance order matters: the status flips first, then membership, then
//! team-chat participation. A stuck `pending` match with its member already
//! inserted heals on retry (the guards make re-runs no-ops); an `accepted`
//! match missing its member would not, so that failure is surfaced.

use chrono::Utc;
use sqlx::AnyPool;
use tokio::sync::broadcast;
use uuid::Uuid;

use atelier_common::error::{AtelierError, WriteStep};
use atelier_common::event::EngineEvent;
use atelier_common::models::matching::{MatchKind, MatchRecord, MatchStatus};
use atelier_common::models::member::{MemberRole, MemberStatus, TeamMember};
use atelier_db::repository::{conversations, matches, participants, team_members};

/// Result of a successful accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcceptOutcome {
    pub match_id: Uuid,
    pub team_id: Uuid,
    /// The individual added to (or already on) the team.
    pub user_added: Uuid,
    /// The request resolved idempotently against an existing confirmed
    /// membership — informational, not an error.
    pub already_member: bool,
}

/// Whether `acting_user` is authorized to accept/reject this match.
///
/// Derived, never stored: a team-initiated invite is answered by the target
/// individual; an individual-initiated join request is answered by a
/// confirmed admin of the target team.
pub async fn can_act(
    pool: &AnyPool,
    m: &MatchRecord,
    acting_user: Uuid,
) -> Result<bool, sqlx::Error> {
    match m.kind {
        MatchKind::TeamToIndividual => Ok(acting_user == m.target_user_id),
        MatchKind::IndividualToTeam => match m.team_id {
            Some(team_id) => team_members::is_confirmed_admin(pool, team_id, acting_user).await,
            None => Ok(false),
        },
        // Mutual-interest matches are symmetric signals, not join requests
        MatchKind::IndividualToIndividual => Ok(false),
    }
}

/// Load a match and verify it is a join request in one of `allowed` states.
async fn load_join_request(
    pool: &AnyPool,
    match_id: Uuid,
    allowed: &[MatchStatus],
) -> Result<MatchRecord, AtelierError> {
    let m = matches::find_by_id(pool, match_id)
        .await?
        .ok_or_else(|| AtelierError::InvalidState {
            reason: format!("match {match_id} not found"),
        })?;

    if !m.kind.is_join_request() {
        return Err(AtelierError::InvalidState {
            reason: "mutual-interest matches have no accept/reject".into(),
        });
    }
    if !allowed.contains(&m.status) {
        return Err(AtelierError::InvalidState {
            reason: format!("match is {}", m.status.as_str()),
        });
    }
    Ok(m)
}

/// Accept a pending join request.
///
/// Side effects are idempotent by construction: the membership and
/// participant inserts are guarded by existence checks, with unique indexes
/// as the storage-level backstop. Re-invocation (double-click, duplicate
/// realtime delivery, retry after a partial failure) re-runs the guards and
/// succeeds without duplicating rows. Only a rejected or missing match
/// fails, with no state change.
pub async fn accept(
    pool: &AnyPool,
    acting_user: Uuid,
    match_id: Uuid,
    events: &broadcast::Sender<EngineEvent>,
) -> Result<AcceptOutcome, AtelierError> {
    let m =
        load_join_request(pool, match_id, &[MatchStatus::Pending, MatchStatus::Accepted]).await?;

    if !can_act(pool, &m, acting_user).await? {
        return Err(AtelierError::Forbidden);
    }

    let team_id = m.team_id.ok_or_else(|| AtelierError::InvalidState {
        reason: "join request has no team".into(),
    })?;
    let user_to_add = m.joining_user();

    // Status first — see module docs for why this order is recoverable.
    if m.status == MatchStatus::Pending {
        let transitioned =
            matches::transition_status(pool, match_id, MatchStatus::Pending, MatchStatus::Accepted)
                .await?;
        if !transitioned {
            // Lost a race; only fine if the winner also accepted.
            let current = matches::find_by_id(pool, match_id).await?;
            if current.map(|c| c.status) != Some(MatchStatus::Accepted) {
                return Err(AtelierError::InvalidState {
                    reason: "match was resolved concurrently".into(),
                });
            }
        }
    }

    // Membership, guarded against an existing confirmed row.
    let mut already_member =
        team_members::find_confirmed(pool, team_id, user_to_add).await?.is_some();
    if !already_member {
        let member = TeamMember {
            team_id,
            user_id: user_to_add,
            role: MemberRole::Member,
            status: MemberStatus::Confirmed,
            joined_at: Utc::now(),
        };
        let inserted = team_members::insert(pool, &member)
            .await
            .map_err(|source| AtelierError::PartialWrite { step: WriteStep::Membership, source })?;
        // A concurrent accept won the insert race — same idempotent outcome.
        already_member = !inserted;
    }
    if already_member {
        tracing::warn!(
            match_id = %match_id,
            team_id = %team_id,
            user_id = %user_to_add,
            "Accept resolved against existing membership"
        );
    }

    // Team chat participation, same guard.
    if let Some(team_chat) = conversations::find_team_conversation(pool, team_id).await? {
        if !participants::is_participant(pool, team_chat.id, user_to_add).await? {
            participants::add(pool, team_chat.id, user_to_add, Utc::now())
                .await
                .map_err(|source| AtelierError::PartialWrite {
                    step: WriteStep::Participant,
                    source,
                })?;
        }
    }

    tracing::info!(
        match_id = %match_id,
        team_id = %team_id,
        user_id = %user_to_add,
        already_member,
        "Join request accepted"
    );

    let _ = events.send(EngineEvent::request_resolved(
        true,
        m.user_id,
        serde_json::json!({
            "match_id": match_id,
            "team_id": team_id,
            "user_id": user_to_add,
        }),
    ));

    Ok(AcceptOutcome { match_id, team_id, user_added: user_to_add, already_member })
}

/// Reject a pending join request. Status update only, no side effects.
/// Re-rejecting an already-rejected match is a no-op success.
pub async fn reject(
    pool: &AnyPool,
    acting_user: Uuid,
    match_id: Uuid,
    events: &broadcast::Sender<EngineEvent>,
) -> Result<(), AtelierError> {
    let m =
        load_join_request(pool, match_id, &[MatchStatus::Pending, MatchStatus::Rejected]).await?;

    if !can_act(pool, &m, acting_user).await? {
        return Err(AtelierError::Forbidden);
    }

    if m.status == MatchStatus::Rejected {
        return Ok(());
    }

    let transitioned =
        matches::transition_status(pool, match_id, MatchStatus::Pending, MatchStatus::Rejected)
            .await?;
    if !transitioned {
        return Err(AtelierError::InvalidState {
            reason: "match was resolved concurrently".into(),
        });
    }

    tracing::info!(match_id = %match_id, "Join request rejected");

    let _ = events.send(EngineEvent::request_resolved(
        false,
        m.user_id,
        serde_json::json!({ "match_id": match_id }),
    ));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{create_match, SwipeTarget};
    use crate::session::Session;
    use crate::testutil;

    fn bus() -> broadcast::Sender<EngineEvent> {
        broadcast::channel(16).0
    }

    // End-to-end: team Rocket (admin carol) receives a join request from
    // dave; carol accepts → status accepted, membership row, team chat
    // participation.
    #[tokio::test]
    async fn accept_join_request_end_to_end() {
        let db = testutil::memory_db().await;
        let carol = testutil::seed_profile(&db.pool, "carol").await;
        let team = testutil::seed_team(&db.pool, carol.id, "Rocket").await;
        let dave = testutil::seed_profile(&db.pool, "dave").await;

        let outcome = create_match(
            &db.pool,
            &Session::solo(dave.id),
            &SwipeTarget::Team(team.clone()),
            &bus(),
        )
        .await
        .unwrap();

        let accepted = accept(&db.pool, carol.id, outcome.match_id, &bus()).await.unwrap();
        assert_eq!(accepted.user_added, dave.id);
        assert!(!accepted.already_member);

        let m = matches::find_by_id(&db.pool, outcome.match_id).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Accepted);

        let membership = team_members::find_confirmed(&db.pool, team.id, dave.id)
            .await
            .unwrap()
            .expect("dave is a member");
        assert_eq!(membership.role, MemberRole::Member);

        let team_chat = conversations::find_team_conversation(&db.pool, team.id)
            .await
            .unwrap()
            .unwrap();
        assert!(participants::is_participant(&db.pool, team_chat.id, dave.id).await.unwrap());
    }

    #[tokio::test]
    async fn accept_twice_never_duplicates_rows() {
        let db = testutil::memory_db().await;
        let carol = testutil::seed_profile(&db.pool, "carol").await;
        let team = testutil::seed_team(&db.pool, carol.id, "Rocket").await;
        let dave = testutil::seed_profile(&db.pool, "dave").await;

        let outcome = create_match(
            &db.pool,
            &Session::solo(dave.id),
            &SwipeTarget::Team(team.clone()),
            &bus(),
        )
        .await
        .unwrap();

        let first = accept(&db.pool, carol.id, outcome.match_id, &bus()).await.unwrap();
        assert!(!first.already_member);

        // Second call on the same match succeeds idempotently.
        let second = accept(&db.pool, carol.id, outcome.match_id, &bus()).await.unwrap();
        assert!(second.already_member);
        assert_eq!(second.user_added, dave.id);

        let members = team_members::list_confirmed(&db.pool, team.id).await.unwrap();
        assert_eq!(members.len(), 2); // carol + dave, no duplicate

        let team_chat = conversations::find_team_conversation(&db.pool, team.id)
            .await
            .unwrap()
            .unwrap();
        let people = participants::list(&db.pool, team_chat.id).await.unwrap();
        assert_eq!(people.len(), 2);
    }

    #[tokio::test]
    async fn accept_is_idempotent_for_existing_members() {
        let db = testutil::memory_db().await;
        let carol = testutil::seed_profile(&db.pool, "carol").await;
        let team = testutil::seed_team(&db.pool, carol.id, "Rocket").await;
        let dave = testutil::seed_profile(&db.pool, "dave").await;

        // Two parallel pending requests for the same user can exist; the
        // second accept must resolve idempotently against the membership
        // created by the first.
        let first = create_match(
            &db.pool,
            &Session::solo(dave.id),
            &SwipeTarget::Team(team.clone()),
            &bus(),
        )
        .await
        .unwrap();
        let second = create_match(
            &db.pool,
            &Session::solo(dave.id),
            &SwipeTarget::Team(team.clone()),
            &bus(),
        )
        .await
        .unwrap();

        let one = accept(&db.pool, carol.id, first.match_id, &bus()).await.unwrap();
        assert!(!one.already_member);

        let two = accept(&db.pool, carol.id, second.match_id, &bus()).await.unwrap();
        assert!(two.already_member);

        let members = team_members::list_confirmed(&db.pool, team.id).await.unwrap();
        assert_eq!(members.len(), 2);
    }

    #[tokio::test]
    async fn only_the_invited_individual_may_resolve_a_team_invite() {
        let db = testutil::memory_db().await;
        let carol = testutil::seed_profile(&db.pool, "carol").await;
        let team = testutil::seed_team(&db.pool, carol.id, "Rocket").await;
        let bob = testutil::seed_profile(&db.pool, "bob").await;
        let mallory = testutil::seed_profile(&db.pool, "mallory").await;

        // Carol invites bob on behalf of Rocket.
        let outcome = create_match(
            &db.pool,
            &Session::with_team(carol.id, team.id),
            &SwipeTarget::Profile(bob.clone()),
            &bus(),
        )
        .await
        .unwrap();

        // Neither a bystander nor the initiating side may resolve it.
        for intruder in [mallory.id, carol.id] {
            let err = accept(&db.pool, intruder, outcome.match_id, &bus()).await.unwrap_err();
            assert!(matches!(err, AtelierError::Forbidden));
        }
        let m = matches::find_by_id(&db.pool, outcome.match_id).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Pending);

        // The invited individual may.
        accept(&db.pool, bob.id, outcome.match_id, &bus()).await.unwrap();
    }

    #[tokio::test]
    async fn only_confirmed_admins_may_resolve_a_join_request() {
        let db = testutil::memory_db().await;
        let carol = testutil::seed_profile(&db.pool, "carol").await;
        let team = testutil::seed_team(&db.pool, carol.id, "Rocket").await;
        let dave = testutil::seed_profile(&db.pool, "dave").await;
        let eve = testutil::seed_profile(&db.pool, "eve").await;

        let outcome = create_match(
            &db.pool,
            &Session::solo(dave.id),
            &SwipeTarget::Team(team.clone()),
            &bus(),
        )
        .await
        .unwrap();

        // A non-member cannot reject; neither can the requester.
        for intruder in [eve.id, dave.id] {
            let err = reject(&db.pool, intruder, outcome.match_id, &bus()).await.unwrap_err();
            assert!(matches!(err, AtelierError::Forbidden));
        }

        // An ordinary (non-admin) member cannot either.
        let frank = testutil::seed_profile(&db.pool, "frank").await;
        let member = TeamMember {
            team_id: team.id,
            user_id: frank.id,
            role: MemberRole::Member,
            status: MemberStatus::Confirmed,
            joined_at: Utc::now(),
        };
        team_members::insert(&db.pool, &member).await.unwrap();
        let err = reject(&db.pool, frank.id, outcome.match_id, &bus()).await.unwrap_err();
        assert!(matches!(err, AtelierError::Forbidden));

        let m = matches::find_by_id(&db.pool, outcome.match_id).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Pending);
    }

    #[tokio::test]
    async fn reject_flips_status_and_nothing_else() {
        let db = testutil::memory_db().await;
        let carol = testutil::seed_profile(&db.pool, "carol").await;
        let team = testutil::seed_team(&db.pool, carol.id, "Rocket").await;
        let dave = testutil::seed_profile(&db.pool, "dave").await;

        let outcome = create_match(
            &db.pool,
            &Session::solo(dave.id),
            &SwipeTarget::Team(team.clone()),
            &bus(),
        )
        .await
        .unwrap();

        reject(&db.pool, carol.id, outcome.match_id, &bus()).await.unwrap();

        let m = matches::find_by_id(&db.pool, outcome.match_id).await.unwrap().unwrap();
        assert_eq!(m.status, MatchStatus::Rejected);
        assert!(team_members::find_confirmed(&db.pool, team.id, dave.id)
            .await
            .unwrap()
            .is_none());

        // Terminal: cannot accept a rejected request.
        let err = accept(&db.pool, carol.id, outcome.match_id, &bus()).await.unwrap_err();
        assert!(matches!(err, AtelierError::InvalidState { .. }));
    }

    #[tokio::test]
    async fn unknown_match_and_mutual_matches_are_invalid_state() {
        let db = testutil::memory_db().await;
        let alice = testutil::seed_profile(&db.pool, "alice").await;
        let bob = testutil::seed_profile(&db.pool, "bob").await;

        let err = accept(&db.pool, alice.id, Uuid::now_v7(), &bus()).await.unwrap_err();
        assert!(matches!(err, AtelierError::InvalidState { .. }));

        let outcome = create_match(
            &db.pool,
            &Session::solo(alice.id),
            &SwipeTarget::Profile(bob.clone()),
            &bus(),
        )
        .await
        .unwrap();
        let err = accept(&db.pool, bob.id, outcome.match_id, &bus()).await.unwrap_err();
        assert!(matches!(err, AtelierError::InvalidState { .. }));
    }
}
