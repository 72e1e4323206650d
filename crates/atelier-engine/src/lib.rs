//! # atelier-engine
//!
//! The match & conversation lifecycle engine: the rules that turn swipe
//! gestures into match and conversation records, resolve join requests,
//! keep team membership and team-chat participation consistent with those
//! transitions, and derive unread state.
//!
//! Operations take an explicit [`session::Session`] and a database pool —
//! there is no ambient per-request context. Mutations emit
//! [`atelier_common::event::EngineEvent`]s on a broadcast channel; the
//! gateway forwards them to connected clients.

pub mod factory;
pub mod feed;
pub mod ledger;
pub mod resolver;
pub mod session;
pub mod unread;

#[cfg(test)]
pub(crate) mod testutil;

pub use factory::{create_match, MatchOutcome, SwipeTarget};
pub use feed::{ConversationFeed, FeedSubscription};
pub use ledger::{SwipeDirection, SwipeEntry, SwipeLedger, SwipeSubject};
pub use resolver::{accept, reject, AcceptOutcome};
pub use session::Session;
pub use unread::UnreadTracker;
