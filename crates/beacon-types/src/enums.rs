//! Enumeration types for the Beacon broadcast service.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Audit events
// ---------------------------------------------------------------------------

/// Which way value moved relative to the home network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Direction {
    /// Value arrived from an external network.
    Inbound,
    /// Value left for an external network.
    Outbound,
}

/// Settlement state of an audit event at the time it was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum EventStatus {
    /// Seen but not yet final.
    Pending,
    /// Final on both sides.
    Confirmed,
}

// ---------------------------------------------------------------------------
// Commerce
// ---------------------------------------------------------------------------

/// Fulfilment state of a shop order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum OrderStatus {
    /// Awaiting payment.
    Pending,
    /// Paid, not yet delivered.
    Processing,
    /// Delivered to the customer.
    Completed,
}

// ---------------------------------------------------------------------------
// Named snapshots
// ---------------------------------------------------------------------------

/// The entities the state store can snapshot by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum EntityKind {
    /// The live [`NetworkStatus`](crate::NetworkStatus) record.
    Network,
    /// The bounded recent-event log, newest first.
    Audit,
    /// Cross-network bridge summary.
    Bridge,
    /// EVM compatibility layer summary.
    Evm,
    /// Shop aggregate statistics.
    Shop,
    /// Recent shop orders.
    Orders,
}

impl EntityKind {
    /// Every entity kind, in a stable order.
    pub const ALL: [Self; 6] = [
        Self::Network,
        Self::Audit,
        Self::Bridge,
        Self::Evm,
        Self::Shop,
        Self::Orders,
    ];

    /// The lowercase name used in URLs and JSON.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Audit => "audit",
            Self::Bridge => "bridge",
            Self::Evm => "evm",
            Self::Shop => "shop",
            Self::Orders => "orders",
        }
    }
}

impl core::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name any [`EntityKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEntity(pub String);

impl core::fmt::Display for UnknownEntity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown entity: {}", self.0)
    }
}

impl std::error::Error for UnknownEntity {}

impl core::str::FromStr for EntityKind {
    type Err = UnknownEntity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownEntity(s.to_owned()))
    }
}
