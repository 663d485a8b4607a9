//! # ids-api
//!
//! REST surface for the Secure-Channel Permission and Real-Time Delivery
//! Engine (§6): server/channel/role CRUD, secure-channel control (C9), and
//! the voice-room REST control operations that sit alongside the voice
//! signaling socket in `ids-voice`.

pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use ids_core::{AuditSink, EventBus, RateLimiter};
use ids_db::Database;

/// Shared application state available to every route handler. Mirrors the
/// teacher's `AppState{db, gateway_tx}` shape, widened with the C2-C6
/// collaborators every secure-channel handler needs.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub bus: EventBus,
    pub rate_limiter: RateLimiter,
    pub audit: AuditSink,
}

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(routes::servers::router())
        .merge(routes::channels::router())
        .merge(routes::roles::router())
        .merge(routes::secure::router())
        .merge(routes::voice::router())
        .merge(routes::health::router());

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
