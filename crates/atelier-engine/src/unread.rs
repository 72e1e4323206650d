//! Unread counting — derives per-conversation unread counts from the
//! per-(user, conversation) read cursor and message timestamps.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::AnyPool;
use uuid::Uuid;

use atelier_db::repository::{message_reads, messages};

/// Messages the user has not seen in one conversation: those sent by
/// someone else after the cursor. No cursor means "never read".
pub async fn unread_count(
    pool: &AnyPool,
    conversation_id: Uuid,
    user_id: Uuid,
) -> Result<i64, sqlx::Error> {
    let cursor = message_reads::find(pool, conversation_id, user_id).await?;
    messages::count_unread_since(pool, conversation_id, user_id, cursor.map(|c| c.last_read_at))
        .await
}

/// Batch variant: one cursor query for the whole set, one count query per
/// conversation. Correct when the user has no cursors at all (cold start —
/// every conversation falls back to "never read").
pub async fn unread_counts(
    pool: &AnyPool,
    conversation_ids: &[Uuid],
    user_id: Uuid,
) -> Result<HashMap<Uuid, i64>, sqlx::Error> {
    let cursors: HashMap<Uuid, chrono::DateTime<Utc>> =
        message_reads::find_many(pool, conversation_ids, user_id)
            .await?
            .into_iter()
            .map(|r| (r.conversation_id, r.last_read_at))
            .collect();

    let mut counts = HashMap::with_capacity(conversation_ids.len());
    for &conversation_id in conversation_ids {
        let count = messages::count_unread_since(
            pool,
            conversation_id,
            user_id,
            cursors.get(&conversation_id).copied(),
        )
        .await?;
        counts.insert(conversation_id, count);
    }
    Ok(counts)
}

/// Session-local unread cache with optimistic mark-read.
///
/// Opening a conversation zeroes its count immediately; the cursor upsert
/// happens after. If the upsert fails the cached entry is invalidated so
/// the next read refetches from persisted state instead of drifting.
#[derive(Debug, Default)]
pub struct UnreadTracker {
    counts: HashMap<Uuid, i64>,
}

impl UnreadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached count, if known.
    pub fn get(&self, conversation_id: Uuid) -> Option<i64> {
        self.counts.get(&conversation_id).copied()
    }

    pub fn set(&mut self, conversation_id: Uuid, count: i64) {
        self.counts.insert(conversation_id, count);
    }

    /// A pushed message from another sender arrived while the conversation
    /// is closed.
    pub fn bump(&mut self, conversation_id: Uuid) {
        *self.counts.entry(conversation_id).or_insert(0) += 1;
    }

    /// Mark a conversation read: zero the local count now, then move the
    /// persisted cursor. On failure the local entry is dropped (next read
    /// reconciles) and the error is returned.
    pub async fn mark_read(
        &mut self,
        pool: &AnyPool,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        self.counts.insert(conversation_id, 0);

        if let Err(err) = message_reads::upsert(pool, conversation_id, user_id, Utc::now()).await {
            self.counts.remove(&conversation_id);
            tracing::warn!(
                conversation_id = %conversation_id,
                "Read-cursor upsert failed, unread count will be refetched: {err}"
            );
            return Err(err);
        }
        Ok(())
    }

    /// Refetch one conversation's count from persisted state.
    pub async fn refresh(
        &mut self,
        pool: &AnyPool,
        conversation_id: Uuid,
        user_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        let count = unread_count(pool, conversation_id, user_id).await?;
        self.counts.insert(conversation_id, count);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;
    use atelier_common::ids;
    use atelier_common::models::message::Message;
    use chrono::Duration;

    async fn seed_message(
        pool: &AnyPool,
        conversation_id: Uuid,
        sender_id: Uuid,
        at: chrono::DateTime<Utc>,
    ) {
        let msg = Message {
            id: ids::generate_id(),
            conversation_id,
            sender_id,
            content: "hello".into(),
            created_at: at,
        };
        atelier_db::repository::messages::insert(pool, &msg).await.unwrap();
    }

    // Messages at t1 < t2 < t3 from another sender, cursor at t2: exactly
    // one message (t3) is unread; after mark_read, zero.
    #[tokio::test]
    async fn cursor_law() {
        let db = testutil::memory_db().await;
        let alice = testutil::seed_profile(&db.pool, "alice").await;
        let bob = testutil::seed_profile(&db.pool, "bob").await;
        let conversation_id = Uuid::now_v7();

        let t1 = Utc::now();
        let t2 = t1 + Duration::seconds(10);
        let t3 = t1 + Duration::seconds(20);
        for t in [t1, t2, t3] {
            seed_message(&db.pool, conversation_id, alice.id, t).await;
        }

        message_reads::upsert(&db.pool, conversation_id, bob.id, t2).await.unwrap();
        assert_eq!(unread_count(&db.pool, conversation_id, bob.id).await.unwrap(), 1);

        let mut tracker = UnreadTracker::new();
        tracker.mark_read(&db.pool, conversation_id, bob.id).await.unwrap();
        assert_eq!(tracker.get(conversation_id), Some(0));
        assert_eq!(unread_count(&db.pool, conversation_id, bob.id).await.unwrap(), 0);

        // Reconciling from persisted state agrees with the optimistic zero
        assert_eq!(tracker.refresh(&db.pool, conversation_id, bob.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_cursor_counts_everything_from_others() {
        let db = testutil::memory_db().await;
        let alice = testutil::seed_profile(&db.pool, "alice").await;
        let bob = testutil::seed_profile(&db.pool, "bob").await;
        let conversation_id = Uuid::now_v7();

        let base = Utc::now();
        seed_message(&db.pool, conversation_id, alice.id, base).await;
        seed_message(&db.pool, conversation_id, bob.id, base + Duration::seconds(1)).await;
        seed_message(&db.pool, conversation_id, alice.id, base + Duration::seconds(2)).await;

        // Bob never opened it: both of alice's messages count, his own never does.
        assert_eq!(unread_count(&db.pool, conversation_id, bob.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn batch_counts_handle_cold_start() {
        let db = testutil::memory_db().await;
        let alice = testutil::seed_profile(&db.pool, "alice").await;
        let bob = testutil::seed_profile(&db.pool, "bob").await;
        let conv_a = Uuid::now_v7();
        let conv_b = Uuid::now_v7();

        let base = Utc::now();
        seed_message(&db.pool, conv_a, alice.id, base).await;
        seed_message(&db.pool, conv_a, alice.id, base + Duration::seconds(1)).await;
        seed_message(&db.pool, conv_b, alice.id, base + Duration::seconds(2)).await;

        // One cursor exists, the other conversation was never opened.
        message_reads::upsert(&db.pool, conv_a, bob.id, base).await.unwrap();

        let counts = unread_counts(&db.pool, &[conv_a, conv_b], bob.id).await.unwrap();
        assert_eq!(counts[&conv_a], 1);
        assert_eq!(counts[&conv_b], 1);

        // No cursors at all
        let carol = testutil::seed_profile(&db.pool, "carol").await;
        let counts = unread_counts(&db.pool, &[conv_a, conv_b], carol.id).await.unwrap();
        assert_eq!(counts[&conv_a], 2);
        assert_eq!(counts[&conv_b], 1);
    }

    #[test]
    fn tracker_bumps_while_closed() {
        let mut tracker = UnreadTracker::new();
        let conv = Uuid::now_v7();
        assert_eq!(tracker.get(conv), None);
        tracker.bump(conv);
        tracker.bump(conv);
        assert_eq!(tracker.get(conv), Some(2));
        tracker.set(conv, 0);
        assert_eq!(tracker.get(conv), Some(0));
    }
}
