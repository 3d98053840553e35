//! Shared application state for the HTTP and `WebSocket` handlers.

use std::sync::Arc;

use beacon_core::config::HubConfig;
use beacon_core::store::StateStore;

use crate::hub::ObserverHub;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. The
/// store is read by the query handlers; the hub is used by the
/// `WebSocket` handler to attach and detach observers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The single source of truth for tracked entities.
    pub store: Arc<StateStore>,
    /// Live observer registry.
    pub hub: Arc<ObserverHub>,
}

impl AppState {
    /// Build state around an existing store with a fresh hub.
    pub fn new(store: Arc<StateStore>, hub_config: &HubConfig) -> Self {
        let hub = Arc::new(ObserverHub::new(Arc::clone(&store), hub_config));
        Self { store, hub }
    }

    /// Build state from parts that are already shared elsewhere, such as
    /// a hub the scheduler also publishes through.
    pub const fn from_parts(store: Arc<StateStore>, hub: Arc<ObserverHub>) -> Self {
        Self { store, hub }
    }
}
