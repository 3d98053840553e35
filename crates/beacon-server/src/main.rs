//! Beacon broadcast service binary.
//!
//! Wires the state store, the observer hub, the update scheduler and the
//! HTTP server together, then runs until `Ctrl-C`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `beacon-config.yaml` (or defaults) plus
//!    `BEACON_*` environment overrides
//! 2. Initialize structured logging (tracing)
//! 3. Build the state store with its seeded records
//! 4. Build the observer hub over the store
//! 5. Bind and spawn the HTTP + `WebSocket` server
//! 6. Spawn the status and event tick tasks
//! 7. Wait for `Ctrl-C`, then stop the scheduler and the server

mod error;

use std::path::Path;
use std::sync::Arc;

use beacon_core::config::{BeaconConfig, LogFormat, LoggingConfig};
use beacon_core::scheduler::{Broadcaster, Scheduler};
use beacon_core::source::{RandomWalk, SyntheticEvents};
use beacon_core::store::StateStore;
use beacon_observer::{AppState, ObserverHub, ServerConfig};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

const CONFIG_FILE: &str = "beacon-config.yaml";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Load configuration. Logging depends on it, so it comes first.
    let (config, from_file) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);

    info!("beacon-server starting");
    info!(
        from_file,
        host = config.http.host,
        port = config.http.port,
        status_interval_ms = config.scheduler.status_interval_ms,
        event_interval_ms = config.scheduler.event_interval_ms,
        event_probability = config.events.probability,
        audit_capacity = config.store.audit_capacity,
        "Configuration loaded"
    );

    // 3. State store.
    let store = Arc::new(StateStore::from_config(&config));
    info!(
        block_height = store.network_status().block_height,
        orders = store.recent_orders().len(),
        "State store initialized"
    );

    // 4. Observer hub.
    let hub = Arc::new(ObserverHub::new(Arc::clone(&store), &config.hub));

    // 5. HTTP + WebSocket server.
    let app_state = Arc::new(AppState::from_parts(Arc::clone(&store), Arc::clone(&hub)));
    let (addr, mut server) =
        beacon_observer::spawn_observer(&ServerConfig::from(&config.http), app_state).await?;

    // 6. Periodic updates.
    let scheduler = Scheduler::new(
        Arc::clone(&store),
        Arc::clone(&hub) as Arc<dyn Broadcaster>,
        config.scheduler.clone(),
    );
    let tasks = scheduler.spawn(
        Box::new(RandomWalk::new(&config.network)),
        Box::new(SyntheticEvents::new(&config.events, &config.network.name)),
    );

    info!(%addr, "beacon-server ready");

    // 7. Run until interrupted or the server dies.
    let outcome = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            signal.map_err(AppError::Signal)
        }
        joined = &mut server => {
            error!(result = ?joined, "Server task ended");
            Err(AppError::ServerExited)
        }
    };

    tasks.shutdown().await;
    server.abort();

    info!(
        block_height = store.network_status().block_height,
        audit_events = store.audit_len(),
        observers = hub.observer_count(),
        "beacon-server shutdown complete"
    );

    outcome
}

/// Load configuration from `beacon-config.yaml` in the working directory,
/// falling back to defaults when the file is absent. Environment
/// overrides apply either way.
///
/// Returns the config and whether the file was read.
fn load_config() -> Result<(BeaconConfig, bool), AppError> {
    let path = Path::new(CONFIG_FILE);
    if path.exists() {
        Ok((BeaconConfig::from_file(path)?, true))
    } else {
        Ok((BeaconConfig::from_env()?, false))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_logging(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match config.format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
