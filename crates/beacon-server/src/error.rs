//! Error types for the `beacon-server` binary.

/// Top-level error for the binary.
///
/// Each variant wraps a startup or runtime failure so that `main` can
/// propagate everything with `?`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration could not be loaded or failed validation.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: beacon_core::config::ConfigError,
    },

    /// The HTTP server could not be started.
    #[error("startup error: {source}")]
    Startup {
        /// The underlying startup error.
        #[from]
        source: beacon_observer::StartupError,
    },

    /// Waiting for the shutdown signal failed.
    #[error("signal error: {0}")]
    Signal(std::io::Error),

    /// The HTTP server task ended on its own.
    #[error("server task exited unexpectedly")]
    ServerExited,
}
