//! HTTP query facade and `WebSocket` push channel for the Beacon
//! broadcast service.
//!
//! This crate provides an Axum server that exposes:
//!
//! - **`WebSocket` endpoint** (`/ws`) that attaches each client to the
//!   [`ObserverHub`] and streams `NETWORK_UPDATE` and `AUDIT_EVENT`
//!   frames
//! - **REST endpoints** under `/api` serving read-only snapshots of the
//!   [`StateStore`]
//! - **Minimal HTML page** (`GET /`) and a liveness check (`GET /health`)
//!
//! # Architecture
//!
//! The hub implements [`Broadcaster`], so the scheduler in
//! `beacon-core` publishes straight into it. Each observer gets a
//! bounded queue; a slow observer loses frames rather than slowing the
//! scheduler or other observers. REST reads go directly to the store and
//! never touch the hub.
//!
//! [`ObserverHub`]: hub::ObserverHub
//! [`StateStore`]: beacon_core::store::StateStore
//! [`Broadcaster`]: beacon_core::scheduler::Broadcaster

pub mod error;
pub mod handlers;
pub mod hub;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use hub::{ObserverHub, ObserverId};
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use startup::{StartupError, spawn_observer};
pub use state::AppState;
