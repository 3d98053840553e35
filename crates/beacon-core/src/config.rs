//! Configuration loading and typed config structures for Beacon.
//!
//! The canonical configuration lives in `beacon-config.yaml` in the
//! working directory. This module defines strongly-typed structs that
//! mirror the YAML structure, and provides a loader that reads and
//! validates the file. Every field has a default, so an empty or missing
//! file yields a working service.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
///
/// Mirrors the structure of `beacon-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BeaconConfig {
    /// HTTP listener settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Starting values and random-walk bounds for the network status.
    #[serde(default)]
    pub network: NetworkConfig,

    /// State store sizing.
    #[serde(default)]
    pub store: StoreConfig,

    /// Periodic task cadence.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Synthetic audit event generation.
    #[serde(default)]
    pub events: EventConfig,

    /// Connection hub sizing.
    #[serde(default)]
    pub hub: HubConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BeaconConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `BEACON_HOST` overrides `http.host`
    /// - `BEACON_PORT` overrides `http.port`
    /// - `BEACON_LOG_LEVEL` overrides `logging.level`
    ///
    /// The result is validated before it is returned.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment
    /// overrides, and validate.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup`, which maps a variable name to its
    /// value when set.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("BEACON_HOST") {
            self.http.host = host;
        }
        if let Some(port) = lookup("BEACON_PORT") {
            self.http.port = port.parse().map_err(|e| ConfigError::Invalid {
                field: "http.port",
                reason: format!("BEACON_PORT={port}: {e}"),
            })?;
        }
        if let Some(level) = lookup("BEACON_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Reject values that would make a periodic task spin, a log hold
    /// nothing, or a probability gate panic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.status_interval_ms == 0 {
            return Err(invalid("scheduler.status_interval_ms", "must be positive"));
        }
        if self.scheduler.event_interval_ms == 0 {
            return Err(invalid("scheduler.event_interval_ms", "must be positive"));
        }
        if self.store.audit_capacity == 0 {
            return Err(invalid("store.audit_capacity", "must be positive"));
        }
        if self.hub.observer_buffer == 0 {
            return Err(invalid("hub.observer_buffer", "must be positive"));
        }
        check_probability("events.probability", self.events.probability)?;
        check_probability(
            "events.confirmed_probability",
            self.events.confirmed_probability,
        )?;
        if self.events.external_networks.is_empty() {
            return Err(invalid("events.external_networks", "must not be empty"));
        }
        if self.events.min_amount_cents == 0
            || self.events.min_amount_cents > self.events.max_amount_cents
        {
            return Err(invalid(
                "events.min_amount_cents",
                "must be positive and not above events.max_amount_cents",
            ));
        }
        if self.network.tps_band == 0 || self.network.tps_band > self.network.tps_baseline {
            return Err(invalid(
                "network.tps_band",
                "must be positive and not above network.tps_baseline",
            ));
        }
        if self.network.max_height_step == 0 {
            return Err(invalid("network.max_height_step", "must be positive"));
        }
        if self.network.min_peers > self.network.max_peers {
            return Err(invalid("network.min_peers", "must not exceed network.max_peers"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

fn check_probability(field: &'static str, p: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{p} is not within 0..=1"),
        })
    }
}

/// HTTP listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port for the query facade and the observer endpoint.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Network status starting values and random-walk bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NetworkConfig {
    /// Network label reported in the status and used as the home side of
    /// audit events.
    #[serde(default = "default_network_name")]
    pub name: String,

    /// Consensus engine label.
    #[serde(default = "default_consensus")]
    pub consensus: String,

    /// Finality label.
    #[serde(default = "default_finality")]
    pub finality: String,

    /// Block height at startup.
    #[serde(default = "default_start_height")]
    pub start_height: u64,

    /// Target block time in milliseconds.
    #[serde(default = "default_block_time_ms")]
    pub block_time_ms: u64,

    /// Active validator count.
    #[serde(default = "default_validators")]
    pub validators: u32,

    /// Centre of the throughput band.
    #[serde(default = "default_tps_baseline")]
    pub tps_baseline: u32,

    /// Half-width of the throughput band.
    #[serde(default = "default_tps_band")]
    pub tps_band: u32,

    /// Largest height increment applied by one status tick.
    #[serde(default = "default_max_height_step")]
    pub max_height_step: u64,

    /// Lower bound for the peer count walk.
    #[serde(default = "default_min_peers")]
    pub min_peers: u32,

    /// Upper bound for the peer count walk.
    #[serde(default = "default_max_peers")]
    pub max_peers: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            name: default_network_name(),
            consensus: default_consensus(),
            finality: default_finality(),
            start_height: default_start_height(),
            block_time_ms: default_block_time_ms(),
            validators: default_validators(),
            tps_baseline: default_tps_baseline(),
            tps_band: default_tps_band(),
            max_height_step: default_max_height_step(),
            min_peers: default_min_peers(),
            max_peers: default_max_peers(),
        }
    }
}

/// State store sizing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StoreConfig {
    /// Maximum number of audit events retained, newest first.
    #[serde(default = "default_audit_capacity")]
    pub audit_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            audit_capacity: default_audit_capacity(),
        }
    }
}

/// Periodic task cadence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchedulerConfig {
    /// Milliseconds between status ticks.
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,

    /// Milliseconds between event ticks.
    #[serde(default = "default_event_interval_ms")]
    pub event_interval_ms: u64,
}

impl SchedulerConfig {
    /// Status tick period.
    pub const fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    /// Event tick period.
    pub const fn event_interval(&self) -> Duration {
        Duration::from_millis(self.event_interval_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            status_interval_ms: default_status_interval_ms(),
            event_interval_ms: default_event_interval_ms(),
        }
    }
}

/// Synthetic audit event generation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventConfig {
    /// Chance that one event tick produces an event.
    #[serde(default = "default_event_probability")]
    pub probability: f64,

    /// Chance that a produced event is already confirmed.
    #[serde(default = "default_confirmed_probability")]
    pub confirmed_probability: f64,

    /// Labels of the networks on the far side of a transfer.
    #[serde(default = "default_external_networks")]
    pub external_networks: Vec<String>,

    /// Smallest amount, in hundredths.
    #[serde(default = "default_min_amount_cents")]
    pub min_amount_cents: u64,

    /// Largest amount, in hundredths.
    #[serde(default = "default_max_amount_cents")]
    pub max_amount_cents: u64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            probability: default_event_probability(),
            confirmed_probability: default_confirmed_probability(),
            external_networks: default_external_networks(),
            min_amount_cents: default_min_amount_cents(),
            max_amount_cents: default_max_amount_cents(),
        }
    }
}

/// Connection hub sizing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HubConfig {
    /// Frames queued per observer before further frames are dropped.
    #[serde(default = "default_observer_buffer")]
    pub observer_buffer: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            observer_buffer: default_observer_buffer(),
        }
    }
}

/// Output format for the log subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Text,
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8080
}

fn default_network_name() -> String {
    String::from("hybrid")
}

fn default_consensus() -> String {
    String::from("tendermint")
}

fn default_finality() -> String {
    String::from("instant")
}

const fn default_start_height() -> u64 {
    beacon_types::DEFAULT_START_HEIGHT
}

const fn default_block_time_ms() -> u64 {
    6000
}

const fn default_validators() -> u32 {
    21
}

const fn default_tps_baseline() -> u32 {
    2000
}

const fn default_tps_band() -> u32 {
    800
}

const fn default_max_height_step() -> u64 {
    3
}

const fn default_min_peers() -> u32 {
    48
}

const fn default_max_peers() -> u32 {
    96
}

const fn default_audit_capacity() -> usize {
    10
}

const fn default_status_interval_ms() -> u64 {
    5000
}

const fn default_event_interval_ms() -> u64 {
    10_000
}

const fn default_event_probability() -> f64 {
    0.3
}

const fn default_confirmed_probability() -> f64 {
    0.8
}

fn default_external_networks() -> Vec<String> {
    vec![
        String::from("base"),
        String::from("polygon"),
        String::from("solana"),
    ]
}

const fn default_min_amount_cents() -> u64 {
    100
}

const fn default_max_amount_cents() -> u64 {
    5_000_000
}

const fn default_observer_buffer() -> usize {
    64
}

fn default_log_level() -> String {
    String::from("info")
}
