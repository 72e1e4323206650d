//! # atelier-api
//!
//! REST API layer for Atelier. Exposes the lifecycle engine over HTTP:
//! profiles, teams, swipes, join requests, conversations, and activity
//! history.

pub mod middleware;
pub mod routes;

use std::collections::HashMap;
use std::sync::Arc;

use atelier_common::event::EngineEvent;
use atelier_db::Database;
use atelier_engine::{SwipeLedger, UnreadTracker};
use axum::Router;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Per-user session state: the swipe ledger behind undo/activity and the
/// unread-count cache. Process-local by design — the persisted match rows
/// remain the source of truth (the ledger is reconstructible from them).
#[derive(Default)]
pub struct UserSession {
    pub ledger: SwipeLedger,
    pub unread: UnreadTracker,
}

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Broadcast sender bridging mutations to the WebSocket gateway.
    pub events_tx: broadcast::Sender<EngineEvent>,
    /// Session-scoped engine state, keyed by user id.
    pub sessions: Arc<RwLock<HashMap<Uuid, UserSession>>>,
}

impl AppState {
    pub fn new(db: Database, events_tx: broadcast::Sender<EngineEvent>) -> Self {
        Self {
            db,
            events_tx,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(routes::health::router())
        .merge(routes::profiles::router())
        .merge(routes::teams::router())
        .merge(routes::swipes::router())
        .merge(routes::requests::router())
        .merge(routes::conversations::router())
        .merge(routes::activity::router());

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::compression::CompressionLayer::new())
        .with_state(Arc::new(state))
}
