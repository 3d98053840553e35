//! State store, data sources, and update scheduler for the Beacon
//! broadcast service.
//!
//! This crate owns everything that changes over time. Delivery to
//! observers is someone else's job: the scheduler publishes through the
//! [`Broadcaster`] trait and never touches a socket.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `beacon-config.yaml` plus
//!   `BEACON_*` environment overrides.
//! - [`store`] -- [`StateStore`], the single owner of network status, the
//!   bounded audit log, and the static auxiliary records.
//! - [`seed`] -- Starting values for a fresh store.
//! - [`source`] -- [`StatusSource`] and [`EventSource`] traits with their
//!   randomized implementations.
//! - [`scheduler`] -- The two periodic tick tasks.
//!
//! [`Broadcaster`]: scheduler::Broadcaster
//! [`StateStore`]: store::StateStore
//! [`StatusSource`]: source::StatusSource
//! [`EventSource`]: source::EventSource

pub mod config;
pub mod scheduler;
pub mod seed;
pub mod source;
pub mod store;

pub use config::BeaconConfig;
pub use scheduler::{Broadcaster, Scheduler, SchedulerHandle};
pub use store::StateStore;
