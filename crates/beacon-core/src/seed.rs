//! Starting values for a freshly constructed store.
//!
//! The network status comes from [`NetworkConfig`]. The auxiliary records
//! are a fixed, hand-written dataset: they exist so the query facade has
//! something realistic to serve and never change afterwards.

use beacon_types::{
    BridgeStatus, EvmStatus, NetworkStatus, Order, OrderId, OrderStatus, ShopStats,
};
use chrono::{DateTime, TimeDelta, Utc};
use rust_decimal::Decimal;

use crate::config::{BeaconConfig, NetworkConfig};
use crate::store::Auxiliary;

/// Product, customer, amount in hundredths, status, age in minutes.
const SEED_ORDERS: [(&str, &str, i64, OrderStatus, i64); 5] = [
    ("Validator License NFT", "0x7a3f...91c2", 50_000, OrderStatus::Completed, 4),
    ("Storage Node License", "0x19be...04ad", 10_000, OrderStatus::Processing, 17),
    ("Hardware Wallet", "0xc04d...7e13", 14_999, OrderStatus::Pending, 42),
    ("Validator License NFT", "0x5e21...aa90", 50_000, OrderStatus::Completed, 95),
    ("Node Starter Kit", "0x8f6a...3b7d", 29_900, OrderStatus::Completed, 180),
];

/// Build the initial [`NetworkStatus`] from configuration.
pub fn starting_status(config: &NetworkConfig) -> NetworkStatus {
    NetworkStatus {
        block_height: config.start_height,
        tps: config.tps_baseline,
        validators: config.validators,
        peers: config.min_peers.midpoint(config.max_peers),
        network: config.name.clone(),
        consensus: config.consensus.clone(),
        block_time_ms: config.block_time_ms,
        finality: config.finality.clone(),
        updated_at: Utc::now(),
    }
}

/// Build the static auxiliary records.
///
/// The bridge lists the home network followed by every configured
/// external network.
pub fn starting_auxiliary(config: &BeaconConfig) -> Auxiliary {
    let supported_networks = std::iter::once(config.network.name.clone())
        .chain(config.events.external_networks.iter().cloned())
        .collect();

    let now = Utc::now();
    let orders = SEED_ORDERS
        .iter()
        .map(|&(product, customer, amount, status, age_minutes)| {
            order(product, customer, amount, status, minutes_ago(now, age_minutes))
        })
        .collect();

    Auxiliary {
        bridge: BridgeStatus {
            operational: true,
            supported_networks,
            pending_transfers: 3,
            completed_24h: 1_284,
            volume_24h: Decimal::new(245_678_050, 2),
            avg_transfer_secs: 45,
        },
        evm: EvmStatus {
            chain_id: 7_777,
            compatible: true,
            rpc_online: true,
            gas_price_gwei: Decimal::new(25, 1),
            contracts_deployed: 1_523,
        },
        shop: ShopStats {
            total_products: 24,
            total_orders: 3_891,
            revenue: Decimal::new(184_592_000, 2),
            active_customers: 612,
            conversion_rate: Decimal::new(34, 3),
        },
        orders,
    }
}

fn minutes_ago(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    now.checked_sub_signed(TimeDelta::minutes(minutes))
        .unwrap_or(now)
}

fn order(
    product: &str,
    customer: &str,
    amount: i64,
    status: OrderStatus,
    created_at: DateTime<Utc>,
) -> Order {
    Order {
        id: OrderId::new(),
        product: product.to_owned(),
        customer: customer.to_owned(),
        amount: Decimal::new(amount, 2),
        status,
        created_at,
    }
}
