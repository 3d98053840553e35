//! Server startup helper for embedding in the `beacon-server` binary.
//!
//! [`spawn_observer`] binds the listener on the caller's task, so a bad
//! or busy address is reported immediately, then serves on a background
//! Tokio task.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::server::{self, ServerConfig, ServerError};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Bind `config` and serve the HTTP + `WebSocket` API in the background.
///
/// Returns the bound address (useful when `config.port` is zero) and the
/// task handle. The server runs until the handle is aborted or the
/// runtime shuts down.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the address is invalid or cannot
/// be bound.
pub async fn spawn_observer(
    config: &ServerConfig,
    state: Arc<AppState>,
) -> Result<(SocketAddr, JoinHandle<()>), StartupError> {
    let listener = server::bind(config).await?;
    let addr = listener
        .local_addr()
        .map_err(|e| ServerError::Bind(format!("no local address: {e}")))?;

    let handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, state).await {
            error!(error = %e, "Server exited with error");
        }
    });

    info!(%addr, "Server spawned on background task");

    Ok((addr, handle))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use beacon_core::config::HubConfig;
    use beacon_core::store::StateStore;

    use super::*;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::new(
            Arc::new(StateStore::default()),
            &HubConfig::default(),
        ))
    }

    fn loopback(port: u16) -> ServerConfig {
        ServerConfig {
            host: String::from("127.0.0.1"),
            port,
        }
    }

    #[tokio::test]
    async fn spawns_on_ephemeral_port() {
        let (addr, handle) = spawn_observer(&loopback(0), state()).await.unwrap();
        assert_ne!(addr.port(), 0);
        assert!(!handle.is_finished());
        handle.abort();
    }

    #[tokio::test]
    async fn busy_port_fails_before_spawning() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let err = spawn_observer(&loopback(port), state()).await.unwrap_err();
        assert!(matches!(err, StartupError::Server(ServerError::Bind(_))));
    }
}
