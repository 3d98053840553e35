//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Records that leave the process carry a strongly-typed ID so audit
//! events and orders can never be confused. All IDs use UUID v7
//! (time-ordered) so clients can sort them without parsing timestamps.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an audit event in the recent-event log.
    AuditEventId
}

define_id! {
    /// Unique identifier for a shop order.
    OrderId
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(AuditEventId::new(), AuditEventId::new());
    }

    #[test]
    fn id_round_trips_through_uuid() {
        let id = OrderId::new();
        let raw: Uuid = id.into();
        assert_eq!(OrderId::from(raw), id);
        assert_eq!(raw.get_version_num(), 7);
    }

    #[test]
    fn id_serializes_as_bare_uuid() {
        let id = AuditEventId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }
}
