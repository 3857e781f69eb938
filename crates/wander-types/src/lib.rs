//! Shared type definitions for the Wander patrol engine.
//!
//! This crate is the single source of truth for the data that flows between
//! the route planner, the inventory triage, the reactive engines, and the
//! transport that talks to the remote service.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for server and session identifiers
//! - [`enums`] -- Item kinds, ball kinds, teams, and server status codes
//! - [`structs`] -- Coordinates, waypoints, landmarks, creatures, inventory
//! - [`results`] -- Request parameters and per-operation responses
//! - [`heartbeat`] -- The multi-part heartbeat payload

pub mod enums;
pub mod heartbeat;
pub mod ids;
pub mod results;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    BallKind, BonusStatus, CatchStatus, DeployStatus, EncounterStatus, ItemKind, LandmarkKind,
    LootStatus, Team, WaypointKind,
};
pub use heartbeat::{
    BadgeAward, Badges, BuddyCandy, HatchedEggs, HeartbeatPart, HeartbeatPayload, InventoryDelta,
    MapCell, MapObjects, RemoteSettings,
};
pub use ids::{CreatureId, EncounterId, IncubatorId, LandmarkId, SessionId, SpawnPointId, SpeciesId};
pub use results::{
    BonusResult, CaptureAward, CaptureProbabilities, CaptureResult, DeployResult,
    EncounterResult, LevelRewards, LootResult, StrongholdInfo, ThrowParameters, WildCreature,
};
pub use structs::{
    CatchableCreature, Coordinate, Egg, Incubator, InventoryEntry, ItemStack, Landmark, Lure,
    MAX_ATTRIBUTE, NearbyCreature, OwnedCreature, PERFECT_SCORE, PlayerStats, Profile, Waypoint,
};
