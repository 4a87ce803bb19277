//! Typed identifier newtypes.
//!
//! Every identifier in the cluster domain is a 128-bit UUID wrapped in its own
//! type. The nil UUID is the "empty" identifier: it is the default value and
//! is never accepted by the store.
//!
//! Fresh identifiers are UUID v7 (time-ordered) generated via
//! [`uuid::Uuid::now_v7`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a new random ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// The empty (nil) identifier.
            #[must_use]
            pub const fn nil() -> Self {
                Self(Uuid::nil())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Borrow the inner UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Whether this is the empty identifier.
            #[must_use]
            pub fn is_nil(&self) -> bool {
                self.0.is_nil()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.hyphenated(), f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_id! {
    /// Identifier of a cluster; the primary key of the entity table.
    ClusterId
}

uuid_id! {
    /// Identifier of the field a cluster belongs to.
    FieldId
}

uuid_id! {
    /// Identifier of the rig associated with a cluster.
    RigId
}

uuid_id! {
    /// Identifier of a slot inside a cluster.
    SlotId
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_nil() {
        assert!(ClusterId::default().is_nil());
        assert_eq!(ClusterId::default(), ClusterId::nil());
    }

    #[test]
    fn new_is_not_nil() {
        assert!(!ClusterId::new().is_nil());
    }

    #[test]
    fn ids_are_unique() {
        assert_ne!(SlotId::new(), SlotId::new());
    }

    #[test]
    fn display_is_lowercase_hyphenated() {
        let id = FieldId::from_uuid(Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef));
        assert_eq!(id.to_string(), "01234567-89ab-cdef-0123-456789abcdef");
    }

    #[test]
    fn display_and_from_str_roundtrip() {
        let id = ClusterId::new();
        let parsed: ClusterId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn from_str_rejects_garbage() {
        assert!("not-a-uuid".parse::<RigId>().is_err());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ClusterId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: ClusterId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn monotonic_ordering() {
        let ids: Vec<ClusterId> = (0..100).map(|_| ClusterId::new()).collect();
        for w in ids.windows(2) {
            assert!(w[0] < w[1], "not monotonic: {} >= {}", w[0], w[1]);
        }
    }
}
