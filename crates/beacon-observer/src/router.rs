//! Axum router construction.
//!
//! Assembles the query routes and the `WebSocket` route into a single
//! [`Router`] with CORS and request tracing.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /health` -- liveness check
/// - `GET /ws` -- `WebSocket` observer stream
/// - `GET /api/network/status`
/// - `GET /api/audit/events`
/// - `GET /api/bridge/status`
/// - `GET /api/evm/status`
/// - `GET /api/shop/stats`
/// - `GET /api/shop/orders`
/// - `GET /api/snapshot/{entity}`
///
/// CORS allows any origin so browser dashboards on other hosts can
/// connect.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        // WebSocket
        .route("/ws", get(ws::ws_observe))
        // REST API
        .route("/api/network/status", get(handlers::network_status))
        .route("/api/audit/events", get(handlers::audit_events))
        .route("/api/bridge/status", get(handlers::bridge_status))
        .route("/api/evm/status", get(handlers::evm_status))
        .route("/api/shop/stats", get(handlers::shop_stats))
        .route("/api/shop/orders", get(handlers::shop_orders))
        .route("/api/snapshot/{entity}", get(handlers::snapshot))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
