//! Envelopes that leave the process.
//!
//! [`ServerMessage`] is the only thing observers ever receive. It
//! serializes as `{"type": "...", "data": ...}` so clients can dispatch
//! on the tag without inspecting the payload.
//!
//! [`EntitySnapshot`] is what the store hands back for a named
//! snapshot; it serializes as the bare payload.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::EntityKind;
use crate::structs::{AuditEvent, BridgeStatus, EvmStatus, NetworkStatus, Order, ShopStats};

/// A server-to-observer push message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "data")]
#[ts(export, export_to = "bindings/")]
pub enum ServerMessage {
    /// The network status after a status tick, or on attachment.
    #[serde(rename = "NETWORK_UPDATE")]
    NetworkUpdate(NetworkStatus),
    /// A single newly recorded audit event.
    #[serde(rename = "AUDIT_EVENT")]
    AuditEvent(AuditEvent),
}

impl ServerMessage {
    /// The wire tag of this message.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NetworkUpdate(_) => "NETWORK_UPDATE",
            Self::AuditEvent(_) => "AUDIT_EVENT",
        }
    }
}

/// The current value of one named entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntitySnapshot {
    /// See [`EntityKind::Network`].
    Network(NetworkStatus),
    /// See [`EntityKind::Audit`].
    Audit(Vec<AuditEvent>),
    /// See [`EntityKind::Bridge`].
    Bridge(BridgeStatus),
    /// See [`EntityKind::Evm`].
    Evm(EvmStatus),
    /// See [`EntityKind::Shop`].
    Shop(ShopStats),
    /// See [`EntityKind::Orders`].
    Orders(Vec<Order>),
}

impl EntitySnapshot {
    /// Which entity this snapshot belongs to.
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Network(_) => EntityKind::Network,
            Self::Audit(_) => EntityKind::Audit,
            Self::Bridge(_) => EntityKind::Bridge,
            Self::Evm(_) => EntityKind::Evm,
            Self::Shop(_) => EntityKind::Shop,
            Self::Orders(_) => EntityKind::Orders,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn network_update_uses_type_data_envelope() {
        let msg = ServerMessage::NetworkUpdate(NetworkStatus::default());
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "NETWORK_UPDATE");
        assert_eq!(json["data"]["block_height"], 2_847_693);
        assert_eq!(msg.kind(), "NETWORK_UPDATE");
    }

    #[test]
    fn entity_snapshot_serializes_bare_payload() {
        let snap = EntitySnapshot::Audit(Vec::new());
        assert_eq!(serde_json::to_value(&snap).unwrap(), serde_json::json!([]));
        assert_eq!(snap.kind(), EntityKind::Audit);
    }
}
