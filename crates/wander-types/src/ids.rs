//! Type-safe identifier wrappers.
//!
//! Server-issued identifiers come in three shapes: 64-bit integers
//! (creatures, encounters), short numeric codes (species), and opaque
//! strings (landmarks, spawn points, incubators). Each gets its own newtype
//! so they cannot be mixed up at compile time. Session identifiers are
//! generated locally with UUID v7 for log correlation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
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
    };
}

/// Generates a `Copy` newtype wrapper around an integer identifier.
macro_rules! define_numeric_id {
    (
        $(#[$meta:meta])*
        $name:ident($inner:ty)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub $inner);

        impl $name {
            /// Return the raw server value.
            pub const fn into_inner(self) -> $inner {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(raw: $inner) -> Self {
                Self(raw)
            }
        }
    };
}

/// Generates a newtype wrapper around an opaque server string.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Borrow the raw server string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }
    };
}

define_uuid_id! {
    /// Locally generated identifier for one authenticated session attempt.
    SessionId
}

define_numeric_id! {
    /// Identifier of a creature (or egg) owned by the player.
    CreatureId(u64)
}

define_numeric_id! {
    /// Identifier of one wild creature appearance, used to start an encounter.
    EncounterId(u64)
}

define_numeric_id! {
    /// Species number in the reference catalog.
    SpeciesId(u16)
}

define_string_id! {
    /// Identifier of a landmark (loot point or stronghold).
    LandmarkId
}

define_string_id! {
    /// Identifier of the spawn point a wild creature appeared at.
    SpawnPointId
}

define_string_id! {
    /// Identifier of an egg incubator.
    IncubatorId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_unique() {
        let a = SessionId::new();
        let b = SessionId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn numeric_id_display_is_raw_value() {
        assert_eq!(CreatureId(42).to_string(), "42");
        assert_eq!(SpeciesId::from(25).into_inner(), 25);
    }

    #[test]
    fn string_id_roundtrip_serde() {
        let original = LandmarkId::from("fort-1a2b");
        let json = serde_json::to_string(&original).ok();
        assert_eq!(json.as_deref(), Some("\"fort-1a2b\""));
        let restored: Result<LandmarkId, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(restored.ok(), Some(original));
    }
}
