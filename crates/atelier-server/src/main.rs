//! # Atelier Server
//!
//! Main binary that orchestrates both Atelier services:
//! - REST API (HTTP)
//! - WebSocket Gateway (real-time events)
//!
//! Both run in a single process and share one event broadcast channel.

use std::net::SocketAddr;

use atelier_api::{build_router, AppState};
use atelier_common::event::EngineEvent;
use atelier_db::Database;
use atelier_gateway::GatewayState;
use tokio::sync::broadcast;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = atelier_common::config::init()?;

    // Initialize tracing (structured logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier=debug,tower_http=debug".into()),
        )
        .with_target(true)
        .init();

    tracing::info!("Starting Atelier v{}", env!("CARGO_PKG_VERSION"));

    // Connect to the database and apply the schema
    let db = Database::connect(config).await?;
    db.migrate().await?;

    // === Shared event broadcast channel ===
    // The bridge between API mutations and the WebSocket gateway: swipes,
    // request resolutions, and messages are announced here and forwarded
    // to connected clients.
    let (events_tx, _) = broadcast::channel::<EngineEvent>(10_000);

    // === REST API Server ===
    let api_state = AppState::new(db.clone(), events_tx.clone());
    let api_router = build_router(api_state);
    let api_addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    // === WebSocket Gateway ===
    let gateway_state = GatewayState::with_events(db.clone(), events_tx);
    let gateway_router = atelier_gateway::build_router(gateway_state);
    let gateway_addr = SocketAddr::new(config.server.host.parse()?, config.server.gateway_port);

    tracing::info!("REST API listening on http://{api_addr}");
    tracing::info!("Gateway listening on ws://{gateway_addr}");

    // Run both servers concurrently
    tokio::try_join!(
        async {
            let listener = tokio::net::TcpListener::bind(api_addr).await?;
            axum::serve(listener, api_router).await?;
            Ok::<_, anyhow::Error>(())
        },
        async {
            let listener = tokio::net::TcpListener::bind(gateway_addr).await?;
            axum::serve(listener, gateway_router).await?;
            Ok::<_, anyhow::Error>(())
        },
    )?;

    Ok(())
}
