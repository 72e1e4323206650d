//! Swipe history ledger — the session-scoped record behind the "undo last"
//! button and the activity review list.
//!
//! The persisted Match rows are the authoritative source; the in-memory
//! ledger is a per-session cache over them, rebuilt on demand via
//! [`reconstruct`]. Undo is local-only: it removes the entry and rolls back
//! the session match counter, but deliberately does not delete the
//! persisted match or conversation — a join request the other side may
//! already be looking at is never silently yanked.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::AnyPool;
use uuid::Uuid;

use atelier_common::models::matching::MatchKind;
use atelier_common::models::profile::Profile;
use atelier_common::models::team::Team;
use atelier_db::repository::{matches, profiles, teams};

/// Snapshot of what was swiped on, as it looked at swipe time.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SwipeSubject {
    Profile(Profile),
    Team(Team),
}

impl SwipeSubject {
    pub fn id(&self) -> Uuid {
        match self {
            Self::Profile(p) => p.id,
            Self::Team(t) => t.id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwipeDirection {
    Left,
    Right,
}

#[derive(Debug, Clone, Serialize)]
pub struct SwipeEntry {
    pub subject: SwipeSubject,
    pub direction: SwipeDirection,
    /// Set when the swipe was a right-swipe that produced a match.
    pub match_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

/// Ordered, append-only swipe log. Single-owner, mutated only by the
/// session that owns it.
#[derive(Debug, Default)]
pub struct SwipeLedger {
    entries: Vec<SwipeEntry>,
    matches_made: usize,
}

impl SwipeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from reconstructed entries (e.g. after a reload).
    pub fn from_entries(entries: Vec<SwipeEntry>) -> Self {
        let matches_made = entries.iter().filter(|e| e.direction == SwipeDirection::Right).count();
        Self { entries, matches_made }
    }

    pub fn record_left(&mut self, subject: SwipeSubject) {
        self.entries.push(SwipeEntry {
            subject,
            direction: SwipeDirection::Left,
            match_id: None,
            at: Utc::now(),
        });
    }

    pub fn record_right(&mut self, subject: SwipeSubject, match_id: Uuid) {
        self.entries.push(SwipeEntry {
            subject,
            direction: SwipeDirection::Right,
            match_id: Some(match_id),
            at: Utc::now(),
        });
        self.matches_made += 1;
    }

    /// Remove the most recent entry. A removed right-swipe rolls the local
    /// match counter back; persisted rows are untouched.
    pub fn undo_last(&mut self) -> Option<SwipeEntry> {
        let entry = self.entries.pop()?;
        if entry.direction == SwipeDirection::Right {
            self.matches_made = self.matches_made.saturating_sub(1);
        }
        Some(entry)
    }

    /// Remove an arbitrary entry by index (the activity list's per-item
    /// undo). Same local-only semantics as [`Self::undo_last`].
    pub fn undo_at(&mut self, index: usize) -> Option<SwipeEntry> {
        if index >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(index);
        if entry.direction == SwipeDirection::Right {
            self.matches_made = self.matches_made.saturating_sub(1);
        }
        Some(entry)
    }

    pub fn entries(&self) -> &[SwipeEntry] {
        &self.entries
    }

    pub fn matches_made(&self) -> usize {
        self.matches_made
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rebuild swipe history from persisted matches: the acting user's matches,
/// newest first, bounded to `limit`. Referenced profiles and teams are
/// batch-resolved in one query each; entries whose subject no longer exists
/// are dropped rather than erroring.
pub async fn reconstruct(
    pool: &AnyPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<SwipeEntry>, sqlx::Error> {
    let records = matches::list_by_actor(pool, user_id, limit).await?;

    let mut profile_ids: Vec<Uuid> = Vec::new();
    let mut team_ids: Vec<Uuid> = Vec::new();
    for m in &records {
        match m.kind {
            MatchKind::IndividualToIndividual | MatchKind::TeamToIndividual => {
                if !profile_ids.contains(&m.target_user_id) {
                    profile_ids.push(m.target_user_id);
                }
            }
            MatchKind::IndividualToTeam => {
                if let Some(team_id) = m.team_id {
                    if !team_ids.contains(&team_id) {
                        team_ids.push(team_id);
                    }
                }
            }
        }
    }

    let profile_map: HashMap<Uuid, Profile> = profiles::find_by_ids(pool, &profile_ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();
    let team_map: HashMap<Uuid, Team> = teams::find_by_ids(pool, &team_ids)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let entries = records
        .into_iter()
        .filter_map(|m| {
            let subject = match m.kind {
                MatchKind::IndividualToIndividual | MatchKind::TeamToIndividual => {
                    profile_map.get(&m.target_user_id).cloned().map(SwipeSubject::Profile)
                }
                MatchKind::IndividualToTeam => {
                    m.team_id.and_then(|t| team_map.get(&t).cloned()).map(SwipeSubject::Team)
                }
            }?;
            Some(SwipeEntry {
                subject,
                direction: SwipeDirection::Right,
                match_id: Some(m.id),
                at: m.created_at,
            })
        })
        .collect();

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{create_match, SwipeTarget};
    use crate::session::Session;
    use crate::testutil;
    use atelier_common::event::EngineEvent;
    use atelier_db::repository::conversations;
    use tokio::sync::broadcast;

    fn bus() -> broadcast::Sender<EngineEvent> {
        broadcast::channel(16).0
    }

    #[test]
    fn undo_last_rolls_back_the_match_counter() {
        let mut ledger = SwipeLedger::new();
        ledger.record_left(SwipeSubject::Profile(testutil::profile_fixture("a")));
        ledger.record_right(SwipeSubject::Profile(testutil::profile_fixture("b")), Uuid::now_v7());
        assert_eq!(ledger.matches_made(), 1);
        assert_eq!(ledger.len(), 2);

        let undone = ledger.undo_last().unwrap();
        assert_eq!(undone.direction, SwipeDirection::Right);
        assert_eq!(ledger.matches_made(), 0);
        assert_eq!(ledger.len(), 1);

        // Left-swipe undo does not touch the counter
        let undone = ledger.undo_last().unwrap();
        assert_eq!(undone.direction, SwipeDirection::Left);
        assert_eq!(ledger.matches_made(), 0);
        assert!(ledger.undo_last().is_none());
    }

    #[test]
    fn undo_at_removes_exactly_one_entry() {
        let mut ledger = SwipeLedger::new();
        let ids: Vec<Uuid> = (0..3)
            .map(|i| {
                let p = testutil::profile_fixture(&format!("p{i}"));
                let id = p.id;
                ledger.record_right(SwipeSubject::Profile(p), Uuid::now_v7());
                id
            })
            .collect();

        let removed = ledger.undo_at(1).unwrap();
        assert_eq!(removed.subject.id(), ids[1]);
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.matches_made(), 2);
        assert_eq!(ledger.entries()[0].subject.id(), ids[0]);
        assert_eq!(ledger.entries()[1].subject.id(), ids[2]);

        assert!(ledger.undo_at(5).is_none());
    }

    #[tokio::test]
    async fn reconstruction_is_ordered_and_idempotent() {
        let db = testutil::memory_db().await;
        let alice = testutil::seed_profile(&db.pool, "alice").await;
        let bob = testutil::seed_profile(&db.pool, "bob").await;
        let carol = testutil::seed_profile(&db.pool, "carol").await;
        let team = testutil::seed_team(&db.pool, carol.id, "Rocket").await;

        let session = Session::solo(alice.id);
        create_match(&db.pool, &session, &SwipeTarget::Profile(bob.clone()), &bus())
            .await
            .unwrap();
        create_match(&db.pool, &session, &SwipeTarget::Team(team.clone()), &bus())
            .await
            .unwrap();

        let first = reconstruct(&db.pool, alice.id, 100).await.unwrap();
        assert_eq!(first.len(), 2);
        // Newest first: the team join request came last
        assert_eq!(first[0].subject.id(), team.id);
        assert_eq!(first[1].subject.id(), bob.id);
        assert!(first.iter().all(|e| e.direction == SwipeDirection::Right));
        assert!(first.iter().all(|e| e.match_id.is_some()));

        // Reconstructing again with no new matches yields an equal sequence
        let second = reconstruct(&db.pool, alice.id, 100).await.unwrap();
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.subject.id(), b.subject.id());
            assert_eq!(a.match_id, b.match_id);
            assert_eq!(a.at, b.at);
        }
    }

    #[tokio::test]
    async fn reconstruction_drops_vanished_subjects() {
        let db = testutil::memory_db().await;
        let alice = testutil::seed_profile(&db.pool, "alice").await;
        let bob = testutil::seed_profile(&db.pool, "bob").await;
        let carol = testutil::seed_profile(&db.pool, "carol").await;
        let team = testutil::seed_team(&db.pool, carol.id, "Rocket").await;

        let session = Session::solo(alice.id);
        create_match(&db.pool, &session, &SwipeTarget::Profile(bob.clone()), &bus())
            .await
            .unwrap();
        create_match(&db.pool, &session, &SwipeTarget::Team(team.clone()), &bus())
            .await
            .unwrap();

        atelier_db::repository::teams::delete(&db.pool, team.id).await.unwrap();

        let entries = reconstruct(&db.pool, alice.id, 100).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].subject.id(), bob.id);
    }

    #[tokio::test]
    async fn undo_does_not_retract_persisted_rows() {
        let db = testutil::memory_db().await;
        let alice = testutil::seed_profile(&db.pool, "alice").await;
        let bob = testutil::seed_profile(&db.pool, "bob").await;

        let session = Session::solo(alice.id);
        let outcome =
            create_match(&db.pool, &session, &SwipeTarget::Profile(bob.clone()), &bus())
                .await
                .unwrap();

        let mut ledger = SwipeLedger::new();
        ledger.record_right(SwipeSubject::Profile(bob.clone()), outcome.match_id);

        let undone = ledger.undo_last().unwrap();
        assert_eq!(undone.match_id, Some(outcome.match_id));
        assert_eq!(ledger.matches_made(), 0);

        // Known limitation, preserved deliberately: the match and its
        // conversation survive the local undo.
        assert!(atelier_db::repository::matches::find_by_id(&db.pool, outcome.match_id)
            .await
            .unwrap()
            .is_some());
        assert!(conversations::find_by_match(&db.pool, outcome.match_id)
            .await
            .unwrap()
            .is_some());
    }
}
