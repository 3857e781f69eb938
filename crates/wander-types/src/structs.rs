//! Core entity structs: coordinates, waypoints, landmarks, creatures, and
//! inventory records.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{ItemKind, LandmarkKind, Team, WaypointKind};
use crate::ids::{CreatureId, EncounterId, IncubatorId, LandmarkId, SpawnPointId, SpeciesId};

/// Highest value of a single individual attribute.
pub const MAX_ATTRIBUTE: u8 = 15;

/// Attribute sum of a creature with every attribute at maximum.
pub const PERFECT_SCORE: u8 = 45;

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// A point on the globe in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, positive north.
    pub latitude: f64,
    /// Longitude in degrees, positive east.
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate from latitude and longitude in degrees.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl core::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{},{}", self.latitude, self.longitude)
    }
}

/// One stop on the patrol route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Canonical position of the stop.
    pub coordinate: Coordinate,
    /// Optional human label carried over from configuration.
    pub label: Option<String>,
    /// Whether the stop is a landmark or an interpolated patrol point.
    pub kind: WaypointKind,
}

/// A lure attached to a landmark, attracting one extra creature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lure {
    /// Species of the lured creature.
    pub species: SpeciesId,
    /// Encounter handle of the lured creature.
    pub encounter_id: EncounterId,
    /// When the lure stops attracting.
    pub expires_at: DateTime<Utc>,
}

/// A landmark reported by a heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Server identifier.
    pub id: LandmarkId,
    /// Position of the landmark.
    pub coordinate: Coordinate,
    /// Loot point or stronghold.
    pub kind: LandmarkKind,
    /// The landmark cannot be looted again before this instant.
    pub cooldown_until: Option<DateTime<Utc>>,
    /// Active or expired lure, if any was ever set.
    pub lure: Option<Lure>,
    /// Owning team (strongholds only).
    pub team: Option<Team>,
}

// ---------------------------------------------------------------------------
// Creatures
// ---------------------------------------------------------------------------

/// A wild creature close enough to encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchableCreature {
    /// Species of the creature.
    pub species: SpeciesId,
    /// Encounter handle.
    pub encounter_id: EncounterId,
    /// Spawn point the creature appeared at.
    pub spawn_point: SpawnPointId,
    /// The landmark whose lure attracted the creature, if any.
    pub lure: Option<LandmarkId>,
}

/// A wild creature visible nearby but out of encounter range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyCreature {
    /// Species of the creature.
    pub species: SpeciesId,
    /// Approximate distance in meters, when the server reports one.
    pub distance_m: Option<f64>,
}

/// A creature owned by the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedCreature {
    /// Server identifier.
    pub id: CreatureId,
    /// Species of the creature.
    pub species: SpeciesId,
    /// Individual attack value (0-15).
    pub attack: u8,
    /// Individual defense value (0-15).
    pub defense: u8,
    /// Individual stamina value (0-15).
    pub stamina: u8,
    /// Combat power.
    pub cp: u32,
    /// Current hit points.
    pub stamina_current: u32,
    /// Maximum hit points.
    pub stamina_max: u32,
    /// Whether the player marked this creature as a favorite.
    pub favorite: bool,
    /// Stronghold the creature currently defends.
    pub deployed_at: Option<LandmarkId>,
}

impl OwnedCreature {
    /// Sum of the three individual attributes.
    pub const fn score(&self) -> u8 {
        self.attack
            .saturating_add(self.defense)
            .saturating_add(self.stamina)
    }

    /// Whether every individual attribute is at maximum.
    pub const fn is_perfect(&self) -> bool {
        self.attack == MAX_ATTRIBUTE
            && self.defense == MAX_ATTRIBUTE
            && self.stamina == MAX_ATTRIBUTE
    }
}

/// An egg waiting to hatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Egg {
    /// Server identifier (eggs share the creature id space).
    pub id: CreatureId,
    /// Distance in kilometers the egg needs to hatch.
    pub target_km: f64,
    /// Incubator currently holding the egg.
    pub incubator: Option<IncubatorId>,
}

/// An egg incubator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incubator {
    /// Server identifier.
    pub id: IncubatorId,
    /// Incubator item kind (limited or unlimited).
    pub item: ItemKind,
    /// Egg currently incubating.
    pub egg: Option<CreatureId>,
    /// Remaining uses for limited incubators.
    pub uses_remaining: Option<u32>,
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Player progression snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Trainer level.
    pub level: u32,
    /// Lifetime experience.
    pub experience: u64,
    /// Lifetime kilometers walked.
    pub km_walked: f64,
}

/// Player profile returned at login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Account display name.
    pub username: String,
    /// Maximum creatures the player can hold.
    pub creature_storage: u32,
    /// Maximum items the player can hold.
    pub item_storage: u32,
    /// Team affiliation, once chosen.
    pub team: Option<Team>,
    /// Currency balances by name.
    pub currencies: BTreeMap<String, u64>,
}

/// A stack of identical items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item kind.
    pub item: ItemKind,
    /// Number of items.
    pub count: u32,
}

/// One record of a raw inventory snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryEntry {
    /// A stack of items.
    Item(ItemStack),
    /// A hatched creature.
    Creature(OwnedCreature),
    /// An unhatched egg.
    Egg(Egg),
    /// The player's incubators.
    Incubators(Vec<Incubator>),
    /// Player progression.
    Stats(PlayerStats),
    /// Candy balance for one species family.
    Candy {
        /// Family species.
        species: SpeciesId,
        /// Candy count.
        count: u32,
    },
}
