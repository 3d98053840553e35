//! Pluggable data sources that drive the scheduler.
//!
//! The scheduler never generates data itself. Each tick it asks a
//! [`StatusSource`] for the next [`StatusDelta`] and an [`EventSource`]
//! for a new [`AuditEvent`], if any. The default implementations,
//! [`RandomWalk`] and [`SyntheticEvents`], produce mock data; a real
//! feed can replace them without touching the store or the hub.

use std::fmt::Write as _;
use std::num::NonZeroU64;

use beacon_types::{AuditEvent, AuditEventId, Direction, EventStatus, NetworkStatus};
use chrono::Utc;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use crate::config::{EventConfig, NetworkConfig};
use crate::store::StatusDelta;

/// Errors a data source can report for a single tick.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The upstream feed could not produce a value this tick.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    /// The source is configured in a way that cannot produce valid data.
    #[error("invalid source setting {setting}: {reason}")]
    Misconfigured {
        /// Name of the offending setting.
        setting: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Produces the next step of the network status walk.
pub trait StatusSource: Send {
    /// Compute the delta to apply on top of `current`.
    fn next_delta(&mut self, current: &NetworkStatus) -> Result<StatusDelta, SourceError>;
}

/// Produces audit events at irregular intervals.
pub trait EventSource: Send {
    /// Return a new event if one arrived since the last poll.
    fn poll_event(&mut self) -> Result<Option<AuditEvent>, SourceError>;
}

// ---------------------------------------------------------------------------
// RandomWalk
// ---------------------------------------------------------------------------

/// Bounded random walk over height, throughput and peers.
///
/// Height moves forward by `1..=max_height_step`; throughput is redrawn
/// uniformly from `baseline ± band`; peers drift by at most two per step
/// and stay within `[min_peers, max_peers]`.
#[derive(Debug, Clone)]
pub struct RandomWalk<R = SmallRng> {
    rng: R,
    tps_baseline: u32,
    tps_band: u32,
    max_height_step: u64,
    min_peers: u32,
    max_peers: u32,
}

impl RandomWalk<SmallRng> {
    /// Create a walk seeded from the thread-local generator.
    pub fn new(config: &NetworkConfig) -> Self {
        Self::with_rng(config, SmallRng::from_rng(&mut rand::rng()))
    }

    /// Create a reproducible walk.
    pub fn seeded(config: &NetworkConfig, seed: u64) -> Self {
        Self::with_rng(config, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomWalk<R> {
    /// Create a walk driven by `rng`.
    pub const fn with_rng(config: &NetworkConfig, rng: R) -> Self {
        Self {
            rng,
            tps_baseline: config.tps_baseline,
            tps_band: config.tps_band,
            max_height_step: config.max_height_step,
            min_peers: config.min_peers,
            max_peers: config.max_peers,
        }
    }
}

impl<R: Rng + Send> StatusSource for RandomWalk<R> {
    fn next_delta(&mut self, current: &NetworkStatus) -> Result<StatusDelta, SourceError> {
        if self.min_peers > self.max_peers {
            return Err(SourceError::Misconfigured {
                setting: "min_peers",
                reason: format!("{} exceeds max_peers {}", self.min_peers, self.max_peers),
            });
        }

        let step = self.rng.random_range(1..=self.max_height_step.max(1));
        let height_increment = NonZeroU64::new(step).unwrap_or(NonZeroU64::MIN);

        let low = self.tps_baseline.saturating_sub(self.tps_band);
        let high = self.tps_baseline.saturating_add(self.tps_band);
        let tps = self.rng.random_range(low..=high);

        let drift: i64 = self.rng.random_range(-2..=2);
        let peers = i64::from(current.peers)
            .saturating_add(drift)
            .clamp(i64::from(self.min_peers), i64::from(self.max_peers));
        let peers = u32::try_from(peers).unwrap_or(self.min_peers);

        Ok(StatusDelta {
            height_increment,
            tps,
            peers,
        })
    }
}

// ---------------------------------------------------------------------------
// SyntheticEvents
// ---------------------------------------------------------------------------

/// Randomised but schema-valid audit events behind a probability gate.
///
/// Each poll produces an event with probability `probability`. Direction
/// is a fair coin; the far side is one of the external networks; status
/// is `confirmed` with probability `confirmed_probability`.
#[derive(Debug, Clone)]
pub struct SyntheticEvents<R = SmallRng> {
    rng: R,
    probability: f64,
    confirmed_probability: f64,
    home_network: String,
    external_networks: Vec<String>,
    min_amount_cents: u64,
    max_amount_cents: u64,
}

impl SyntheticEvents<SmallRng> {
    /// Create a generator seeded from the thread-local generator.
    pub fn new(config: &EventConfig, home_network: &str) -> Self {
        Self::with_rng(config, home_network, SmallRng::from_rng(&mut rand::rng()))
    }

    /// Create a reproducible generator.
    pub fn seeded(config: &EventConfig, home_network: &str, seed: u64) -> Self {
        Self::with_rng(config, home_network, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SyntheticEvents<R> {
    /// Create a generator driven by `rng`.
    pub fn with_rng(config: &EventConfig, home_network: &str, rng: R) -> Self {
        Self {
            rng,
            probability: config.probability,
            confirmed_probability: config.confirmed_probability,
            home_network: home_network.to_owned(),
            external_networks: config.external_networks.clone(),
            min_amount_cents: config.min_amount_cents,
            max_amount_cents: config.max_amount_cents,
        }
    }

    /// Build one event unconditionally, bypassing the probability gate.
    pub fn synthesize(&mut self) -> Result<AuditEvent, SourceError> {
        let confirmed_probability = checked_probability(
            "confirmed_probability",
            self.confirmed_probability,
        )?;
        if self.external_networks.is_empty() {
            return Err(SourceError::Misconfigured {
                setting: "external_networks",
                reason: String::from("no networks to pick from"),
            });
        }
        if self.min_amount_cents > self.max_amount_cents {
            return Err(SourceError::Misconfigured {
                setting: "min_amount_cents",
                reason: format!(
                    "{} exceeds max_amount_cents {}",
                    self.min_amount_cents, self.max_amount_cents
                ),
            });
        }

        let idx = self.rng.random_range(0..self.external_networks.len());
        let external = self
            .external_networks
            .get(idx)
            .cloned()
            .unwrap_or_default();

        let direction = if self.rng.random_bool(0.5) {
            Direction::Inbound
        } else {
            Direction::Outbound
        };
        let (source, target) = match direction {
            Direction::Inbound => (external, self.home_network.clone()),
            Direction::Outbound => (self.home_network.clone(), external),
        };

        let cents = self
            .rng
            .random_range(self.min_amount_cents..=self.max_amount_cents);
        let cents = i64::try_from(cents).map_err(|e| SourceError::Misconfigured {
            setting: "max_amount_cents",
            reason: e.to_string(),
        })?;

        let status = if self.rng.random_bool(confirmed_probability) {
            EventStatus::Confirmed
        } else {
            EventStatus::Pending
        };

        let created_at = Utc::now();
        Ok(AuditEvent {
            id: AuditEventId::new(),
            direction,
            source,
            target,
            tx_hash: hex(&self.rng.random::<[u8; 32]>()),
            amount: Decimal::new(cents, 2),
            from: hex(&self.rng.random::<[u8; 20]>()),
            to: hex(&self.rng.random::<[u8; 20]>()),
            timestamp: created_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            status,
            created_at,
        })
    }
}

impl<R: Rng + Send> EventSource for SyntheticEvents<R> {
    fn poll_event(&mut self) -> Result<Option<AuditEvent>, SourceError> {
        let probability = checked_probability("probability", self.probability)?;
        if !self.rng.random_bool(probability) {
            return Ok(None);
        }
        self.synthesize().map(Some)
    }
}

/// `random_bool` panics outside `0..=1`, so reject those up front.
fn checked_probability(setting: &'static str, p: f64) -> Result<f64, SourceError> {
    if (0.0..=1.0).contains(&p) {
        Ok(p)
    } else {
        Err(SourceError::Misconfigured {
            setting,
            reason: format!("{p} is not within 0..=1"),
        })
    }
}

/// `0x`-prefixed lowercase hex.
fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len().saturating_mul(2).saturating_add(2));
    out.push_str("0x");
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status_with_peers(peers: u32) -> NetworkStatus {
        NetworkStatus {
            peers,
            ..NetworkStatus::default()
        }
    }

    #[test]
    fn walk_stays_within_configured_bounds() {
        let config = NetworkConfig::default();
        let mut walk = RandomWalk::seeded(&config, 7);
        let mut current = status_with_peers(config.min_peers);

        for _ in 0..500 {
            let delta = walk.next_delta(&current).unwrap();
            assert!((1..=config.max_height_step).contains(&delta.height_increment.get()));
            assert!((1200..=2800).contains(&delta.tps));
            assert!((config.min_peers..=config.max_peers).contains(&delta.peers));
            current.peers = delta.peers;
        }
    }

    #[test]
    fn walk_is_reproducible_with_same_seed() {
        let config = NetworkConfig::default();
        let current = NetworkStatus::default();
        let mut a = RandomWalk::seeded(&config, 42);
        let mut b = RandomWalk::seeded(&config, 42);
        for _ in 0..20 {
            assert_eq!(
                a.next_delta(&current).unwrap(),
                b.next_delta(&current).unwrap()
            );
        }
    }

    #[test]
    fn walk_rejects_inverted_peer_bounds() {
        let config = NetworkConfig {
            min_peers: 10,
            max_peers: 5,
            ..NetworkConfig::default()
        };
        let mut walk = RandomWalk::seeded(&config, 1);
        let err = walk.next_delta(&NetworkStatus::default()).unwrap_err();
        assert!(matches!(
            err,
            SourceError::Misconfigured {
                setting: "min_peers",
                ..
            }
        ));
    }

    #[test]
    fn synthesized_events_are_schema_valid() {
        let config = EventConfig::default();
        let mut events = SyntheticEvents::seeded(&config, "hybrid", 3);

        for _ in 0..200 {
            let event = events.synthesize().unwrap();
            match event.direction {
                Direction::Inbound => {
                    assert_eq!(event.target, "hybrid");
                    assert!(config.external_networks.contains(&event.source));
                }
                Direction::Outbound => {
                    assert_eq!(event.source, "hybrid");
                    assert!(config.external_networks.contains(&event.target));
                }
            }
            assert!(event.tx_hash.starts_with("0x"));
            assert_eq!(event.tx_hash.len(), 66);
            assert_eq!(event.from.len(), 42);
            assert_eq!(event.to.len(), 42);
            assert!(event.amount >= Decimal::new(100, 2));
            assert!(event.amount <= Decimal::new(5_000_000, 2));
        }
    }

    #[test]
    fn status_is_skewed_toward_confirmed() {
        let config = EventConfig::default();
        let mut events = SyntheticEvents::seeded(&config, "hybrid", 11);
        let confirmed = (0..1000)
            .filter(|_| events.synthesize().unwrap().status == EventStatus::Confirmed)
            .count();
        assert!(confirmed > 700, "confirmed = {confirmed}");
        assert!(confirmed < 900, "confirmed = {confirmed}");
    }

    #[test]
    fn probability_gate_is_respected() {
        let never = EventConfig {
            probability: 0.0,
            ..EventConfig::default()
        };
        let mut events = SyntheticEvents::seeded(&never, "hybrid", 5);
        assert!((0..100).all(|_| events.poll_event().unwrap().is_none()));

        let always = EventConfig {
            probability: 1.0,
            ..EventConfig::default()
        };
        let mut events = SyntheticEvents::seeded(&always, "hybrid", 5);
        assert!((0..100).all(|_| events.poll_event().unwrap().is_some()));
    }

    #[test]
    fn default_gate_fires_roughly_thirty_percent() {
        let mut events = SyntheticEvents::seeded(&EventConfig::default(), "hybrid", 19);
        let fired = (0..2000)
            .filter(|_| events.poll_event().unwrap().is_some())
            .count();
        assert!((450..=750).contains(&fired), "fired = {fired}");
    }

    #[test]
    fn out_of_range_probability_is_an_error_not_a_panic() {
        let config = EventConfig {
            probability: 2.0,
            ..EventConfig::default()
        };
        let mut events = SyntheticEvents::seeded(&config, "hybrid", 1);
        assert!(events.poll_event().is_err());
    }

    #[test]
    fn hex_is_prefixed_and_padded() {
        assert_eq!(hex(&[0x00, 0x0f, 0xab]), "0x000fab");
        assert_eq!(hex(&[]), "0x");
    }
}
