//! Shared type definitions for the Beacon broadcast service.
//!
//! Every record the service stores, pushes, or serves is defined here.
//! Types flow downstream to `TypeScript` via `ts-rs` for dashboard
//! clients.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for record identifiers
//! - [`enums`] -- Direction, settlement, order and entity enumerations
//! - [`structs`] -- Network status, audit events and auxiliary records
//! - [`message`] -- Observer push envelope and named snapshots

pub mod enums;
pub mod ids;
pub mod message;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Direction, EntityKind, EventStatus, OrderStatus, UnknownEntity};
pub use ids::{AuditEventId, OrderId};
pub use message::{EntitySnapshot, ServerMessage};
pub use structs::{
    AuditEvent, BridgeStatus, DEFAULT_START_HEIGHT, EvmStatus, NetworkStatus, Order, ShopStats,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. Importing them here triggers generation.
        // The actual files are written to the `bindings/` directory
        // relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::AuditEventId::export_all();
        let _ = crate::ids::OrderId::export_all();

        // Enums
        let _ = crate::enums::Direction::export_all();
        let _ = crate::enums::EventStatus::export_all();
        let _ = crate::enums::OrderStatus::export_all();
        let _ = crate::enums::EntityKind::export_all();

        // Structs
        let _ = crate::structs::NetworkStatus::export_all();
        let _ = crate::structs::AuditEvent::export_all();
        let _ = crate::structs::BridgeStatus::export_all();
        let _ = crate::structs::EvmStatus::export_all();
        let _ = crate::structs::ShopStats::export_all();
        let _ = crate::structs::Order::export_all();

        // Envelope
        let _ = crate::message::ServerMessage::export_all();
    }
}
