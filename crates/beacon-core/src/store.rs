//! The in-memory state store.
//!
//! [`StateStore`] is the single source of truth for every entity the
//! service tracks. The live [`NetworkStatus`] and the bounded audit log
//! sit behind one [`RwLock`], so `advance`, `append_event` and every
//! snapshot are linearizable with respect to each other. The auxiliary
//! records never change after construction and are read without locking.
//!
//! No method performs I/O and no lock is held across an `.await`. A
//! poisoned lock is recovered rather than propagated: the guarded data is
//! only ever replaced whole-field, so it is never left half-written.

use std::collections::VecDeque;
use std::num::NonZeroU64;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use beacon_types::{
    AuditEvent, BridgeStatus, EntityKind, EntitySnapshot, EvmStatus, NetworkStatus, Order,
    ShopStats,
};
use chrono::Utc;

use crate::config::BeaconConfig;
use crate::seed;

/// Audit log capacity used when none is configured.
pub const DEFAULT_AUDIT_CAPACITY: usize = 10;

/// One step of the network status random walk.
///
/// Produced by a [`StatusSource`](crate::source::StatusSource) and
/// applied atomically by [`StateStore::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDelta {
    /// How far the block height moves forward. Never zero.
    pub height_increment: NonZeroU64,
    /// Redrawn throughput.
    pub tps: u32,
    /// Redrawn peer count.
    pub peers: u32,
}

/// Static records served by the query facade only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Auxiliary {
    /// Bridge summary.
    pub bridge: BridgeStatus,
    /// EVM layer summary.
    pub evm: EvmStatus,
    /// Shop aggregates.
    pub shop: ShopStats,
    /// Recent orders, newest first.
    pub orders: Vec<Order>,
}

#[derive(Debug)]
struct LiveState {
    network: NetworkStatus,
    audit_log: VecDeque<AuditEvent>,
}

/// Owner of all tracked entities.
#[derive(Debug)]
pub struct StateStore {
    live: RwLock<LiveState>,
    auxiliary: Auxiliary,
    audit_capacity: usize,
}

impl StateStore {
    /// Create a store with explicit starting values.
    ///
    /// An `audit_capacity` of zero is raised to one so the newest event
    /// is always retained.
    pub fn new(network: NetworkStatus, audit_capacity: usize, auxiliary: Auxiliary) -> Self {
        let audit_capacity = audit_capacity.max(1);
        Self {
            live: RwLock::new(LiveState {
                network,
                audit_log: VecDeque::with_capacity(audit_capacity),
            }),
            auxiliary,
            audit_capacity,
        }
    }

    /// Create a store seeded from configuration.
    pub fn from_config(config: &BeaconConfig) -> Self {
        Self::new(
            seed::starting_status(&config.network),
            config.store.audit_capacity,
            seed::starting_auxiliary(config),
        )
    }

    fn read(&self) -> RwLockReadGuard<'_, LiveState> {
        self.live.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LiveState> {
        self.live.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Apply one random-walk step and return the resulting status.
    ///
    /// The height saturates at `u64::MAX` rather than wrapping, so it
    /// never decreases.
    pub fn advance(&self, delta: StatusDelta) -> NetworkStatus {
        let mut live = self.write();
        let network = &mut live.network;
        network.block_height = network
            .block_height
            .saturating_add(delta.height_increment.get());
        network.tps = delta.tps;
        network.peers = delta.peers;
        network.updated_at = Utc::now();
        network.clone()
    }

    /// Insert `event` at the head of the audit log, evicting the oldest
    /// entry if the log is over capacity.
    pub fn append_event(&self, event: AuditEvent) {
        let mut live = self.write();
        live.audit_log.push_front(event);
        live.audit_log.truncate(self.audit_capacity);
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The current value of the named entity.
    pub fn snapshot(&self, kind: EntityKind) -> EntitySnapshot {
        match kind {
            EntityKind::Network => EntitySnapshot::Network(self.network_status()),
            EntityKind::Audit => EntitySnapshot::Audit(self.audit_events()),
            EntityKind::Bridge => EntitySnapshot::Bridge(self.bridge_status()),
            EntityKind::Evm => EntitySnapshot::Evm(self.evm_status()),
            EntityKind::Shop => EntitySnapshot::Shop(self.shop_stats()),
            EntityKind::Orders => EntitySnapshot::Orders(self.recent_orders()),
        }
    }

    /// The current network status.
    pub fn network_status(&self) -> NetworkStatus {
        self.read().network.clone()
    }

    /// The audit log, newest first.
    pub fn audit_events(&self) -> Vec<AuditEvent> {
        self.read().audit_log.iter().cloned().collect()
    }

    /// Number of events currently retained.
    pub fn audit_len(&self) -> usize {
        self.read().audit_log.len()
    }

    /// Maximum number of events retained.
    pub const fn audit_capacity(&self) -> usize {
        self.audit_capacity
    }

    /// Bridge summary.
    pub fn bridge_status(&self) -> BridgeStatus {
        self.auxiliary.bridge.clone()
    }

    /// EVM layer summary.
    pub fn evm_status(&self) -> EvmStatus {
        self.auxiliary.evm.clone()
    }

    /// Shop aggregates.
    pub fn shop_stats(&self) -> ShopStats {
        self.auxiliary.shop.clone()
    }

    /// Recent orders, newest first.
    pub fn recent_orders(&self) -> Vec<Order> {
        self.auxiliary.orders.clone()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new(
            NetworkStatus::default(),
            DEFAULT_AUDIT_CAPACITY,
            Auxiliary::default(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use beacon_types::{AuditEventId, Direction, EventStatus};
    use rust_decimal::Decimal;

    use super::*;

    fn step(increment: u64, tps: u32) -> StatusDelta {
        StatusDelta {
            height_increment: NonZeroU64::new(increment).unwrap(),
            tps,
            peers: tps,
        }
    }

    fn event(n: i64) -> AuditEvent {
        AuditEvent {
            id: AuditEventId::new(),
            direction: Direction::Inbound,
            source: String::from("base"),
            target: String::from("hybrid"),
            tx_hash: format!("0x{n:064x}"),
            amount: Decimal::new(n, 2),
            from: String::from("0xfrom"),
            to: String::from("0xto"),
            timestamp: String::from("2026-01-01 00:00:00 UTC"),
            status: EventStatus::Confirmed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn default_store_returns_defined_defaults() {
        let store = StateStore::default();
        let status = store.network_status();
        assert_eq!(
            status,
            NetworkStatus {
                updated_at: status.updated_at,
                ..NetworkStatus::default()
            }
        );
        assert!(store.audit_events().is_empty());
        assert_eq!(store.bridge_status(), BridgeStatus::default());
        assert_eq!(store.audit_capacity(), DEFAULT_AUDIT_CAPACITY);
    }

    #[test]
    fn three_advances_move_height_strictly_forward() {
        let store = StateStore::default();
        assert_eq!(store.network_status().block_height, 2_847_693);

        store.advance(step(1, 1500));
        store.advance(step(2, 1600));
        let last = store.advance(step(3, 1700));

        assert_eq!(last.block_height, 2_847_699);
        assert_eq!(last.tps, 1700);
        assert_eq!(store.network_status(), last);
    }

    #[test]
    fn height_saturates_instead_of_wrapping() {
        let start = NetworkStatus {
            block_height: u64::MAX.saturating_sub(1),
            ..NetworkStatus::default()
        };
        let store = StateStore::new(start, 10, Auxiliary::default());
        store.advance(step(5, 1));
        assert_eq!(store.network_status().block_height, u64::MAX);
    }

    #[test]
    fn log_length_grows_to_capacity_then_holds() {
        let store = StateStore::default();
        for n in 0..25 {
            let prior = store.audit_len();
            store.append_event(event(n));
            assert_eq!(store.audit_len(), prior.saturating_add(1).min(10));
        }
    }

    #[test]
    fn log_is_newest_first() {
        let store = StateStore::default();
        let events: Vec<AuditEvent> = (0..4).map(event).collect();
        for e in &events {
            store.append_event(e.clone());
        }
        let expected: Vec<AuditEvent> = events.into_iter().rev().collect();
        assert_eq!(store.audit_events(), expected);
    }

    #[test]
    fn eleventh_event_evicts_only_the_oldest() {
        let store = StateStore::default();
        let events: Vec<AuditEvent> = (0..10).map(event).collect();
        for e in &events {
            store.append_event(e.clone());
        }
        let newest = event(99);
        store.append_event(newest.clone());

        let log = store.audit_events();
        assert_eq!(log.len(), 10);
        assert_eq!(log.first(), Some(&newest));
        assert!(!log.contains(events.first().unwrap()));
        assert_eq!(log.last(), events.get(1));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let store = StateStore::new(NetworkStatus::default(), 0, Auxiliary::default());
        store.append_event(event(1));
        let latest = event(2);
        store.append_event(latest.clone());
        assert_eq!(store.audit_events(), vec![latest]);
    }

    #[test]
    fn snapshot_by_kind_matches_typed_accessors() {
        let store = StateStore::from_config(&BeaconConfig::default());
        store.append_event(event(7));
        for kind in EntityKind::ALL {
            let snap = store.snapshot(kind);
            assert_eq!(snap.kind(), kind);
        }
        assert_eq!(
            store.snapshot(EntityKind::Audit),
            EntitySnapshot::Audit(store.audit_events())
        );
        assert_eq!(
            store.snapshot(EntityKind::Orders),
            EntitySnapshot::Orders(store.recent_orders())
        );
    }

    #[test]
    fn concurrent_snapshots_never_see_partial_advance() {
        let start = NetworkStatus {
            tps: 0,
            peers: 0,
            ..NetworkStatus::default()
        };
        let store = Arc::new(StateStore::new(start, 10, Auxiliary::default()));
        std::thread::scope(|scope| {
            let writer = Arc::clone(&store);
            scope.spawn(move || {
                for n in 1..=2000_u32 {
                    writer.advance(step(1, n));
                }
            });
            for _ in 0..4 {
                let reader = Arc::clone(&store);
                scope.spawn(move || {
                    let mut last_height = 0;
                    for _ in 0..2000 {
                        let status = reader.network_status();
                        // advance writes tps and peers from the same value
                        assert_eq!(status.tps, status.peers);
                        assert!(status.block_height >= last_height);
                        last_height = status.block_height;
                    }
                });
            }
        });
        assert_eq!(store.network_status().block_height, 2_849_693);
    }
}
