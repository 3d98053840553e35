//! Core entity structs held by the state store.
//!
//! [`NetworkStatus`] and [`AuditEvent`] are pushed to observers; the
//! remaining records are read-only auxiliaries served by the query
//! facade only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Direction, EventStatus, OrderStatus};
use crate::ids::{AuditEventId, OrderId};

/// Block height the store starts from when no other value is configured.
pub const DEFAULT_START_HEIGHT: u64 = 2_847_693;

// ---------------------------------------------------------------------------
// NetworkStatus
// ---------------------------------------------------------------------------

/// Live status of the tracked network.
///
/// A single record, created once when the store is built and mutated in
/// place on every status tick. `block_height` never decreases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NetworkStatus {
    /// Current block height.
    pub block_height: u64,
    /// Transactions per second observed over the last tick.
    pub tps: u32,
    /// Number of active validators.
    pub validators: u32,
    /// Number of connected peers.
    pub peers: u32,
    /// Human-readable network label.
    pub network: String,
    /// Consensus engine label.
    pub consensus: String,
    /// Target block time in milliseconds.
    pub block_time_ms: u64,
    /// Finality description shown to clients.
    pub finality: String,
    /// When this record was last advanced.
    pub updated_at: DateTime<Utc>,
}

impl Default for NetworkStatus {
    fn default() -> Self {
        Self {
            block_height: DEFAULT_START_HEIGHT,
            tps: 2000,
            validators: 21,
            peers: 72,
            network: String::from("hybrid"),
            consensus: String::from("tendermint"),
            block_time_ms: 6000,
            finality: String::from("instant"),
            updated_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// AuditEvent
// ---------------------------------------------------------------------------

/// One cross-network transfer recorded in the recent-event log.
///
/// Immutable once created. The store keeps only the newest few.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AuditEvent {
    /// Unique event identifier.
    pub id: AuditEventId,
    /// Whether value entered or left the home network.
    pub direction: Direction,
    /// Network the transfer originated on.
    pub source: String,
    /// Network the transfer settled on.
    pub target: String,
    /// Transaction hash on the source network.
    pub tx_hash: String,
    /// Transferred amount.
    #[ts(as = "String")]
    pub amount: Decimal,
    /// Sending address.
    pub from: String,
    /// Receiving address.
    pub to: String,
    /// Preformatted timestamp for display.
    pub timestamp: String,
    /// Settlement state when recorded.
    pub status: EventStatus,
    /// Real-world time the event was created.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Auxiliary snapshots
// ---------------------------------------------------------------------------

/// Summary of the cross-network bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BridgeStatus {
    /// Whether the bridge is accepting transfers.
    pub operational: bool,
    /// Networks the bridge connects to.
    pub supported_networks: Vec<String>,
    /// Transfers waiting for confirmation.
    pub pending_transfers: u32,
    /// Transfers completed in the last 24 hours.
    pub completed_24h: u32,
    /// Value moved in the last 24 hours.
    #[ts(as = "String")]
    pub volume_24h: Decimal,
    /// Mean transfer time in seconds.
    pub avg_transfer_secs: u32,
}

/// Summary of the EVM compatibility layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EvmStatus {
    /// EIP-155 chain identifier.
    pub chain_id: u64,
    /// Whether EVM transactions are accepted.
    pub compatible: bool,
    /// Whether the JSON-RPC endpoint is reachable.
    pub rpc_online: bool,
    /// Current gas price in gwei.
    #[ts(as = "String")]
    pub gas_price_gwei: Decimal,
    /// Number of contracts deployed.
    pub contracts_deployed: u64,
}

/// Aggregate shop statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ShopStats {
    /// Products listed.
    pub total_products: u32,
    /// Orders ever placed.
    pub total_orders: u64,
    /// Revenue across all orders.
    #[ts(as = "String")]
    pub revenue: Decimal,
    /// Customers with an order in the last 30 days.
    pub active_customers: u32,
    /// Fraction of visits that convert, 0 to 1.
    #[ts(as = "String")]
    pub conversion_rate: Decimal,
}

/// A single shop order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Order {
    /// Unique order identifier.
    pub id: OrderId,
    /// Product name.
    pub product: String,
    /// Customer label.
    pub customer: String,
    /// Order total.
    #[ts(as = "String")]
    pub amount: Decimal,
    /// Fulfilment state.
    pub status: OrderStatus,
    /// When the order was placed.
    pub created_at: DateTime<Utc>,
}
