//! REST query handlers.
//!
//! Every handler reads straight from the [`StateStore`] held in
//! [`AppState`]. None of them touch the hub or mutate anything.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/health` | Liveness check |
//! | `GET` | `/api/network/status` | Current network status |
//! | `GET` | `/api/audit/events` | Audit log, newest first |
//! | `GET` | `/api/bridge/status` | Bridge summary |
//! | `GET` | `/api/evm/status` | EVM layer summary |
//! | `GET` | `/api/shop/stats` | Shop aggregates |
//! | `GET` | `/api/shop/orders` | Recent orders |
//! | `GET` | `/api/snapshot/{entity}` | Any entity by name |
//!
//! [`StateStore`]: beacon_core::store::StateStore

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::response::{Html, IntoResponse};
use beacon_types::{BridgeStatus, EntityKind, EvmStatus, NetworkStatus, Order, ShopStats};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing live figures and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.store.network_status();
    let height = status.block_height;
    let tps = status.tps;
    let peers = status.peers;
    let network = status.network;
    let events = state.store.audit_len();
    let observers = state.hub.observer_count();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Beacon</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        .metric {{
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #8b949e; font-size: 0.85rem; }}
        .metric .value {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #58a6ff; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        li::before {{ content: "GET "; color: #7ee787; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Beacon</h1>
    <p class="subtitle">Live state for the {network} network</p>

    <div>
        <div class="metric">
            <div class="label">Block height</div>
            <div class="value">{height}</div>
        </div>
        <div class="metric">
            <div class="label">TPS</div>
            <div class="value">{tps}</div>
        </div>
        <div class="metric">
            <div class="label">Peers</div>
            <div class="value">{peers}</div>
        </div>
        <div class="metric">
            <div class="label">Audit events</div>
            <div class="value">{events}</div>
        </div>
        <div class="metric">
            <div class="label">Observers</div>
            <div class="value">{observers}</div>
        </div>
    </div>

    <h2>API Endpoints</h2>
    <ul>
        <li><a href="/api/network/status">/api/network/status</a></li>
        <li><a href="/api/audit/events">/api/audit/events</a></li>
        <li><a href="/api/bridge/status">/api/bridge/status</a></li>
        <li><a href="/api/evm/status">/api/evm/status</a></li>
        <li><a href="/api/shop/stats">/api/shop/stats</a></li>
        <li><a href="/api/shop/orders">/api/shop/orders</a></li>
        <li><a href="/api/snapshot/network">/api/snapshot/{{entity}}</a></li>
    </ul>

    <h2>WebSocket</h2>
    <p><code>ws://host:port/ws</code> streams NETWORK_UPDATE and AUDIT_EVENT frames.</p>
</body>
</html>"#
    ))
}

/// Liveness check.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// Typed entity endpoints
// ---------------------------------------------------------------------------

/// Current network status.
pub async fn network_status(State(state): State<Arc<AppState>>) -> Json<NetworkStatus> {
    Json(state.store.network_status())
}

/// The audit log, newest first, with its retention limit.
pub async fn audit_events(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let events = state.store.audit_events();

    Ok(Json(serde_json::json!({
        "count": events.len(),
        "capacity": state.store.audit_capacity(),
        "events": serde_json::to_value(events)?,
    })))
}

/// Bridge summary.
pub async fn bridge_status(State(state): State<Arc<AppState>>) -> Json<BridgeStatus> {
    Json(state.store.bridge_status())
}

/// EVM layer summary.
pub async fn evm_status(State(state): State<Arc<AppState>>) -> Json<EvmStatus> {
    Json(state.store.evm_status())
}

/// Shop aggregates.
pub async fn shop_stats(State(state): State<Arc<AppState>>) -> Json<ShopStats> {
    Json(state.store.shop_stats())
}

/// Recent orders, newest first.
pub async fn shop_orders(State(state): State<Arc<AppState>>) -> Json<Vec<Order>> {
    Json(state.store.recent_orders())
}

// ---------------------------------------------------------------------------
// GET /api/snapshot/{entity}
// ---------------------------------------------------------------------------

/// Any entity by name. Names are matched case-insensitively; an
/// unknown name is a 404.
pub async fn snapshot(
    State(state): State<Arc<AppState>>,
    Path(entity): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let kind = entity
        .parse::<EntityKind>()
        .map_err(|e| ObserverError::NotFound(e.to_string()))?;

    Ok(Json(serde_json::to_value(state.store.snapshot(kind))?))
}
