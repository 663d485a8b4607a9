//! # ids-server
//!
//! Main binary that orchestrates the core's three services:
//! - REST API (HTTP) — server/channel/role CRUD and the secure-channel
//!   control surface (C9)
//! - WebSocket gateway — real-time message/typing/read-receipt delivery (C7)
//! - Voice signaling hub — heartbeat/fingerprint/signal relay (C8)
//!
//! All three run in a single process sharing one database pool and one
//! in-process event bus; there is no cross-process or cross-node fan-out.

use ids_api::{build_router, AppState};
use ids_core::{AuditSink, EventBus, RateLimiter};
use ids_db::Database;
use ids_gateway::GatewayState;
use ids_voice::VoiceState;
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ids_common::config::init()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ids=debug,tower_http=debug".into()),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    tracing::info!("starting ids-server v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::connect(config).await?;
    db.migrate().await?;

    // Shared collaborators (C4-C6): one rate limiter, one audit sink, one bus
    // for the whole process — the API publishes, the gateway and voice hub
    // subscribe.
    let bus = EventBus::new();
    let rate_limiter = RateLimiter::new(config.limits.rate_limit_window_secs, config.limits.rate_limit_cap);
    ids_core::rate_limiter::spawn_sweeper(rate_limiter.clone(), config.limits.rate_limit_window_secs);
    let audit = AuditSink::new(db.pool.clone(), bus.clone());

    let api_state = AppState {
        db: db.clone(),
        bus: bus.clone(),
        rate_limiter,
        audit,
    };
    let api_router = build_router(api_state);
    let api_addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    let gateway_state = GatewayState::new(db.clone(), bus.clone());
    let gateway_router = ids_gateway::build_router(gateway_state);
    let gateway_addr = SocketAddr::new(config.server.host.parse()?, config.server.gateway_port);

    let voice_state = VoiceState::new(db.clone(), bus.clone());
    let voice_router = ids_voice::build_router(voice_state);
    let voice_addr = SocketAddr::new(config.server.host.parse()?, config.server.voice_port);

    tracing::info!("REST API listening on http://{api_addr}");
    tracing::info!("gateway listening on ws://{gateway_addr}");
    tracing::info!("voice hub listening on ws://{voice_addr}");

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
        async {
            let listener = tokio::net::TcpListener::bind(voice_addr).await?;
            axum::serve(listener, voice_router).await?;
            Ok::<_, anyhow::Error>(())
        },
    )?;

    Ok(())
}
