//! Match factory — translates a right-swipe into persisted Match +
//! Conversation + participant rows, choosing the correct shape.
//!
//! The preferred write path is the atomic bundle (one transaction). If that
//! fails, the factory retries the same three inserts sequentially; a
//! sequential failure after the match insert surfaces as
//! [`AtelierError::PartialWrite`] naming the failed step — a match without
//! its conversation is never reported as success.
//!
//! Operations are cancel-safe up to the first write: dropping the future
//! before the bundle/first insert leaves no state behind, but an issued
//! write is never revoked.

use chrono::Utc;
use sqlx::AnyPool;
use tokio::sync::broadcast;
use uuid::Uuid;

use atelier_common::error::{AtelierError, WriteStep};
use atelier_common::event::EngineEvent;
use atelier_common::ids;
use atelier_common::models::conversation::{Conversation, ConversationKind};
use atelier_common::models::matching::{MatchRecord, MatchShape, MatchStatus};
use atelier_common::models::profile::Profile;
use atelier_common::models::team::Team;
use atelier_db::repository::{conversations, matches, participants};

use crate::session::Session;

/// What the actor swiped on. Carries the full row so shape resolution can
/// reach the team owner without another read.
#[derive(Debug, Clone)]
pub enum SwipeTarget {
    Profile(Profile),
    Team(Team),
}

impl SwipeTarget {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Profile(p) => p.id,
            Self::Team(t) => t.id,
        }
    }
}

/// Result of a successful right-swipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub match_id: Uuid,
    pub conversation_id: Uuid,
}

/// Decide the match shape for a swipe, rejecting invalid combinations
/// before any write.
pub fn resolve_shape(session: &Session, target: &SwipeTarget) -> Result<MatchShape, AtelierError> {
    match target {
        SwipeTarget::Profile(profile) => {
            if profile.id == session.user_id {
                return Err(AtelierError::Validation {
                    message: "Cannot swipe on yourself".into(),
                });
            }
            match session.team_id {
                Some(team_id) => Ok(MatchShape::TeamInvite {
                    team_id,
                    actor_id: session.user_id,
                    target_user_id: profile.id,
                }),
                None => Ok(MatchShape::Mutual {
                    actor_id: session.user_id,
                    target_user_id: profile.id,
                }),
            }
        }
        SwipeTarget::Team(team) => {
            if team.owner_id == session.user_id {
                return Err(AtelierError::Validation {
                    message: "Cannot request to join your own team".into(),
                });
            }
            Ok(MatchShape::JoinRequest {
                actor_id: session.user_id,
                team_id: team.id,
                owner_id: team.owner_id,
            })
        }
    }
}

/// The explicit team-representative path: swipe on an individual on behalf
/// of the session's team. Fails with [`AtelierError::NoTeam`] when the
/// session has no team — checked before any write occurs.
pub fn resolve_team_invite(
    session: &Session,
    target_user_id: Uuid,
) -> Result<MatchShape, AtelierError> {
    let team_id = session.team_id.ok_or(AtelierError::NoTeam)?;
    Ok(MatchShape::TeamInvite {
        team_id,
        actor_id: session.user_id,
        target_user_id,
    })
}

/// Create the match and its direct conversation for a right-swipe.
pub async fn create_match(
    pool: &AnyPool,
    session: &Session,
    target: &SwipeTarget,
    events: &broadcast::Sender<EngineEvent>,
) -> Result<MatchOutcome, AtelierError> {
    let shape = resolve_shape(session, target)?;
    create_from_shape(pool, shape, events).await
}

/// Persist a resolved shape: match row (status `pending`), direct
/// conversation linked to it, one participant per side.
pub async fn create_from_shape(
    pool: &AnyPool,
    shape: MatchShape,
    events: &broadcast::Sender<EngineEvent>,
) -> Result<MatchOutcome, AtelierError> {
    let now = Utc::now();
    let record = MatchRecord {
        id: ids::generate_id(),
        user_id: shape.actor_id(),
        target_user_id: shape.target_user_id(),
        team_id: shape.team_id(),
        kind: shape.kind(),
        status: MatchStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    let conversation = Conversation {
        id: ids::generate_id(),
        kind: ConversationKind::Direct,
        match_id: Some(record.id),
        team_id: None,
        created_at: now,
        updated_at: now,
    };
    let sides = shape.participants();

    match matches::create_bundle(pool, &record, &conversation, &sides, now).await {
        Ok(()) => {}
        Err(err) => {
            tracing::warn!(
                match_id = %record.id,
                "Atomic match bundle failed ({err}), retrying sequentially"
            );
            create_sequential(pool, &record, &conversation, &sides).await?;
        }
    }

    tracing::info!(
        match_id = %record.id,
        conversation_id = %conversation.id,
        kind = record.kind.as_str(),
        "Match created"
    );

    let _ = events.send(EngineEvent::match_create(
        record.target_user_id,
        serde_json::json!({
            "match_id": record.id,
            "conversation_id": conversation.id,
            "kind": record.kind,
            "from_user_id": record.user_id,
            "team_id": record.team_id,
        }),
    ));

    Ok(MatchOutcome {
        match_id: record.id,
        conversation_id: conversation.id,
    })
}

/// Sequential fallback for collaborators without an atomic procedure. Each
/// insert maps its failure to the step it belongs to.
async fn create_sequential(
    pool: &AnyPool,
    record: &MatchRecord,
    conversation: &Conversation,
    sides: &[Uuid; 2],
) -> Result<(), AtelierError> {
    matches::insert(pool, record)
        .await
        .map_err(|source| AtelierError::PartialWrite { step: WriteStep::Match, source })?;

    conversations::insert(pool, conversation)
        .await
        .map_err(|source| AtelierError::PartialWrite { step: WriteStep::Conversation, source })?;

    for &user_id in sides {
        participants::add(pool, conversation.id, user_id, record.created_at)
            .await
            .map_err(|source| AtelierError::PartialWrite {
                step: WriteStep::Participant,
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use atelier_common::models::matching::MatchKind;
    use atelier_db::repository::{matches as match_repo, messages};
    use atelier_common::models::message::Message;

    fn bus() -> broadcast::Sender<EngineEvent> {
        broadcast::channel(16).0
    }

    #[test]
    fn solo_swipe_on_profile_is_mutual() {
        let actor = Session::solo(Uuid::now_v7());
        let profile = testutil::profile_fixture("bob");
        let shape = resolve_shape(&actor, &SwipeTarget::Profile(profile.clone())).unwrap();
        assert_eq!(
            shape,
            MatchShape::Mutual { actor_id: actor.user_id, target_user_id: profile.id }
        );
    }

    #[test]
    fn team_member_swipe_on_profile_is_team_invite() {
        let team_id = Uuid::now_v7();
        let actor = Session::with_team(Uuid::now_v7(), team_id);
        let profile = testutil::profile_fixture("bob");
        let shape = resolve_shape(&actor, &SwipeTarget::Profile(profile.clone())).unwrap();
        assert_eq!(shape.kind(), MatchKind::TeamToIndividual);
        assert_eq!(shape.team_id(), Some(team_id));
        assert_eq!(shape.target_user_id(), profile.id);
    }

    #[test]
    fn team_invite_without_team_fails_before_any_write() {
        let actor = Session::solo(Uuid::now_v7());
        let err = resolve_team_invite(&actor, Uuid::now_v7()).unwrap_err();
        assert!(matches!(err, AtelierError::NoTeam));
    }

    #[test]
    fn self_swipe_is_rejected() {
        let actor = Session::solo(Uuid::now_v7());
        let mut profile = testutil::profile_fixture("me");
        profile.id = actor.user_id;
        let err = resolve_shape(&actor, &SwipeTarget::Profile(profile)).unwrap_err();
        assert!(matches!(err, AtelierError::Validation { .. }));
    }

    #[tokio::test]
    async fn swipe_on_team_targets_its_owner() {
        let db = testutil::memory_db().await;
        let owner = testutil::seed_profile(&db.pool, "carol").await;
        let team = testutil::seed_team(&db.pool, owner.id, "Rocket").await;
        let dave = testutil::seed_profile(&db.pool, "dave").await;

        let session = Session::solo(dave.id);
        let outcome = create_match(&db.pool, &session, &SwipeTarget::Team(team.clone()), &bus())
            .await
            .unwrap();

        let m = match_repo::find_by_id(&db.pool, outcome.match_id).await.unwrap().unwrap();
        assert_eq!(m.kind, MatchKind::IndividualToTeam);
        assert_eq!(m.user_id, dave.id);
        assert_eq!(m.target_user_id, owner.id);
        assert_eq!(m.team_id, Some(team.id));
        assert_eq!(m.status, MatchStatus::Pending);
    }

    #[tokio::test]
    async fn mutual_match_creates_conversation_with_both_participants() {
        let db = testutil::memory_db().await;
        let alice = testutil::seed_profile(&db.pool, "alice").await;
        let bob = testutil::seed_profile(&db.pool, "bob").await;

        let session = Session::solo(alice.id);
        let outcome = create_match(&db.pool, &session, &SwipeTarget::Profile(bob.clone()), &bus())
            .await
            .unwrap();

        let m = match_repo::find_by_id(&db.pool, outcome.match_id).await.unwrap().unwrap();
        assert_eq!(m.kind, MatchKind::IndividualToIndividual);
        assert_eq!(m.user_id, alice.id);
        assert_eq!(m.target_user_id, bob.id);

        let conv = conversations::find_by_match(&db.pool, outcome.match_id)
            .await
            .unwrap()
            .expect("conversation linked to match");
        assert_eq!(conv.id, outcome.conversation_id);
        assert_eq!(conv.kind, ConversationKind::Direct);

        let mut people: Vec<Uuid> = participants::list(&db.pool, conv.id)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.user_id)
            .collect();
        people.sort();
        let mut expected = vec![alice.id, bob.id];
        expected.sort();
        assert_eq!(people, expected);
    }

    #[tokio::test]
    async fn sequential_fallback_produces_the_same_rows() {
        let db = testutil::memory_db().await;
        let alice = testutil::seed_profile(&db.pool, "alice").await;
        let bob = testutil::seed_profile(&db.pool, "bob").await;

        let shape = MatchShape::Mutual { actor_id: alice.id, target_user_id: bob.id };
        let now = Utc::now();
        let record = MatchRecord {
            id: ids::generate_id(),
            user_id: alice.id,
            target_user_id: bob.id,
            team_id: None,
            kind: shape.kind(),
            status: MatchStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let conversation = Conversation {
            id: ids::generate_id(),
            kind: ConversationKind::Direct,
            match_id: Some(record.id),
            team_id: None,
            created_at: now,
            updated_at: now,
        };

        create_sequential(&db.pool, &record, &conversation, &shape.participants())
            .await
            .unwrap();

        assert!(match_repo::find_by_id(&db.pool, record.id).await.unwrap().is_some());
        assert!(conversations::find_by_match(&db.pool, record.id).await.unwrap().is_some());
        assert_eq!(participants::list(&db.pool, conversation.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn sequential_failure_names_the_step() {
        let db = testutil::memory_db().await;
        let alice = testutil::seed_profile(&db.pool, "alice").await;
        let bob = testutil::seed_profile(&db.pool, "bob").await;

        let now = Utc::now();
        let record = MatchRecord {
            id: ids::generate_id(),
            user_id: alice.id,
            target_user_id: bob.id,
            team_id: None,
            kind: MatchKind::IndividualToIndividual,
            status: MatchStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let conversation = Conversation {
            id: ids::generate_id(),
            kind: ConversationKind::Direct,
            match_id: Some(record.id),
            team_id: None,
            created_at: now,
            updated_at: now,
        };

        // Inserting the same match twice violates the primary key: the
        // second sequential run must fail at the match step, not silently
        // continue to the conversation insert.
        create_sequential(&db.pool, &record, &conversation, &[alice.id, bob.id])
            .await
            .unwrap();
        let err = create_sequential(&db.pool, &record, &conversation, &[alice.id, bob.id])
            .await
            .unwrap_err();
        match err {
            AtelierError::PartialWrite { step, .. } => assert_eq!(step, WriteStep::Match),
            other => panic!("expected PartialWrite, got {other:?}"),
        }
    }

    // End-to-end: alice (no team) swipes right on bob; a pending mutual
    // match and a 2-participant conversation exist; alice can message into
    // it and bob sees one unread until he opens it.
    #[tokio::test]
    async fn mutual_swipe_end_to_end() {
        let db = testutil::memory_db().await;
        let alice = testutil::seed_profile(&db.pool, "alice").await;
        let bob = testutil::seed_profile(&db.pool, "bob").await;

        let session = Session::solo(alice.id);
        let outcome = create_match(&db.pool, &session, &SwipeTarget::Profile(bob.clone()), &bus())
            .await
            .unwrap();

        let msg = Message {
            id: ids::generate_id(),
            conversation_id: outcome.conversation_id,
            sender_id: alice.id,
            content: "hey! want to team up?".into(),
            created_at: Utc::now(),
        };
        messages::insert(&db.pool, &msg).await.unwrap();

        let unread = crate::unread::unread_count(&db.pool, outcome.conversation_id, bob.id)
            .await
            .unwrap();
        assert_eq!(unread, 1);

        // Alice's own message does not count against her
        let own = crate::unread::unread_count(&db.pool, outcome.conversation_id, alice.id)
            .await
            .unwrap();
        assert_eq!(own, 0);

        atelier_db::repository::message_reads::upsert(
            &db.pool,
            outcome.conversation_id,
            bob.id,
            Utc::now(),
        )
        .await
        .unwrap();
        let after = crate::unread::unread_count(&db.pool, outcome.conversation_id, bob.id)
            .await
            .unwrap();
        assert_eq!(after, 0);
    }
}
