//! HTTP server lifecycle.
//!
//! Binding and serving are separate steps so that an unusable address
//! fails startup instead of failing later inside a background task.

use std::net::SocketAddr;
use std::sync::Arc;

use beacon_core::config::HttpConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Listen address for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// The host address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// The TCP port to listen on. Zero picks a free port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for ServerConfig {
    fn from(config: &HttpConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

impl ServerConfig {
    /// Parse `host:port` into a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the host is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|e| ServerError::Bind(format!("invalid address {addr}: {e}")))
    }
}

/// Bind a TCP listener for `config`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] if the address is invalid or in use.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = config.socket_addr()?;
    TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))
}

/// Serve the router on an already bound listener until the task is
/// aborted or a fatal I/O error occurs.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] on a fatal serving error.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Beacon server listening");
    }

    axum::serve(listener, build_router(state))
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))
}

/// Bind and serve in one step.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind or the server
/// encounters a fatal I/O error.
pub async fn start_server(config: &ServerConfig, state: Arc<AppState>) -> Result<(), ServerError> {
    let listener = bind(config).await?;
    serve(listener, state).await
}

/// Errors that can occur when starting or running the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to bind to the network address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
