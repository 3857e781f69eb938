//! Enumeration types shared by the planner, the engines, and the transport.
//!
//! Server statuses are closed enums with an `Unrecognized` variant that
//! carries the raw code of anything newer; the engines log those and move
//! on.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Route and world
// ---------------------------------------------------------------------------

/// What a route point represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointKind {
    /// A point inserted by interpolation to keep walking gaps bounded.
    Patrol,
    /// A point that sits on a known landmark.
    Landmark,
}

/// The two kinds of in-world points of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkKind {
    /// A point that hands out items when looted.
    LootPoint,
    /// A contested point creatures can be deployed to.
    Stronghold,
}

/// Team affiliation of a player or a stronghold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// No team chosen / unowned stronghold.
    Neutral,
    /// Blue team.
    Blue,
    /// Red team.
    Red,
    /// Yellow team.
    Yellow,
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// Capture ball kinds, ordered from weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BallKind {
    /// Standard ball.
    Poke,
    /// Improved ball.
    Great,
    /// High-grade ball.
    Ultra,
    /// Ball that never misses.
    Master,
}

impl BallKind {
    /// Every ball kind in ascending quality order.
    pub const ALL: [Self; 4] = [Self::Poke, Self::Great, Self::Ultra, Self::Master];

    /// The inventory item that represents this ball.
    pub const fn item(self) -> ItemKind {
        match self {
            Self::Poke => ItemKind::PokeBall,
            Self::Great => ItemKind::GreatBall,
            Self::Ultra => ItemKind::UltraBall,
            Self::Master => ItemKind::MasterBall,
        }
    }

    /// The ball kind for an inventory item, if the item is a ball.
    pub const fn from_item(item: ItemKind) -> Option<Self> {
        match item {
            ItemKind::PokeBall => Some(Self::Poke),
            ItemKind::GreatBall => Some(Self::Great),
            ItemKind::UltraBall => Some(Self::Ultra),
            ItemKind::MasterBall => Some(Self::Master),
            _ => None,
        }
    }
}

/// Inventory item kinds known to the engine.
///
/// Codes follow the server's numbering; anything else decodes to
/// [`ItemKind::Unknown`] and keeps its raw code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Standard capture ball.
    PokeBall,
    /// Improved capture ball.
    GreatBall,
    /// High-grade capture ball.
    UltraBall,
    /// Capture ball that never misses.
    MasterBall,
    /// Restores 20 stamina.
    Potion,
    /// Restores 50 stamina.
    SuperPotion,
    /// Restores 200 stamina.
    HyperPotion,
    /// Restores all stamina.
    MaxPotion,
    /// Revives a fainted creature at half stamina.
    Revive,
    /// Revives a fainted creature at full stamina.
    MaxRevive,
    /// Doubles experience for a while.
    LuckyEgg,
    /// Attracts creatures to the player.
    Incense,
    /// Lure module placed on a landmark.
    LureModule,
    /// Berry that makes the next capture easier.
    RazzBerry,
    /// Incubator that never wears out.
    IncubatorUnlimited,
    /// Incubator with a limited number of uses.
    Incubator,
    /// An item code the engine has no name for.
    Unknown(u32),
}

impl ItemKind {
    /// Whether this item counts against the item storage limit.
    pub const fn counts_toward_storage(self) -> bool {
        !matches!(self, Self::IncubatorUnlimited)
    }
}

// ---------------------------------------------------------------------------
// Server statuses
// ---------------------------------------------------------------------------

/// Result status of an encounter request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncounterStatus {
    /// Server-side error.
    Error,
    /// The encounter started.
    Success,
    /// The creature is no longer there.
    NotFound,
    /// The encounter window closed.
    Closed,
    /// The creature fled before the encounter started.
    Fled,
    /// The player is too far away.
    NotInRange,
    /// This player already encountered the creature.
    AlreadyHappened,
    /// No room left in creature storage.
    InventoryFull,
    /// A status code the engine does not know.
    Unrecognized(i32),
}

impl EncounterStatus {
    /// Human-readable reason for log lines.
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Error => "encounter error",
            Self::Success => "success",
            Self::NotFound => "creature not found",
            Self::Closed => "encounter closed",
            Self::Fled => "creature fled",
            Self::NotInRange => "not in range",
            Self::AlreadyHappened => "already encountered",
            Self::InventoryFull => "creature storage full",
            Self::Unrecognized(_) => "unrecognized status",
        }
    }
}

/// Result status of a capture throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatchStatus {
    /// Server-side error, no throw happened.
    Error,
    /// The creature was captured.
    Success,
    /// The creature broke out of the ball.
    Escape,
    /// The creature broke out and ran.
    Flee,
    /// The throw missed.
    Missed,
    /// A status code the engine does not know.
    Unrecognized(i32),
}

impl CatchStatus {
    /// Human-readable reason for log lines.
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Error => "unexpected error",
            Self::Success => "successful catch",
            Self::Escape => "catch escape",
            Self::Flee => "catch flee",
            Self::Missed => "missed catch",
            Self::Unrecognized(_) => "unrecognized status",
        }
    }
}

/// Result status of a loot request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LootStatus {
    /// The server did not set a result.
    NoResult,
    /// Items were handed out.
    Success,
    /// The player is too far away.
    OutOfRange,
    /// The landmark is still cooling down.
    InCooldown,
    /// No room left in item storage.
    InventoryFull,
    /// A status code the engine does not know.
    Unrecognized(i32),
}

impl LootStatus {
    /// Human-readable reason for log lines.
    pub const fn reason(self) -> &'static str {
        match self {
            Self::NoResult => "no result set",
            Self::Success => "success",
            Self::OutOfRange => "out of range",
            Self::InCooldown => "in cooldown period",
            Self::InventoryFull => "inventory full",
            Self::Unrecognized(_) => "unrecognized status",
        }
    }
}

/// Result status of a stronghold deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStatus {
    /// The creature now defends the stronghold.
    Success,
    /// The player already has a creature there.
    AlreadyDeployed,
    /// No free slot.
    StrongholdFull,
    /// The stronghold belongs to another team.
    WrongTeam,
    /// The player is too far away.
    NotInRange,
    /// The player level is below the minimum.
    PlayerLevelTooLow,
    /// A status code the engine does not know.
    Unrecognized(i32),
}

impl DeployStatus {
    /// Human-readable reason for log lines.
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Success => "deployed",
            Self::AlreadyDeployed => "already defending",
            Self::StrongholdFull => "stronghold full",
            Self::WrongTeam => "wrong team",
            Self::NotInRange => "not in range",
            Self::PlayerLevelTooLow => "player level too low",
            Self::Unrecognized(_) => "unrecognized status",
        }
    }
}

/// Result status of a defender bonus collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusStatus {
    /// Bonus collected.
    Success,
    /// No creature currently deployed.
    NoDefenders,
    /// Collected too recently.
    TooSoon,
    /// A status code the engine does not know.
    Unrecognized(i32),
}

impl BonusStatus {
    /// Human-readable reason for log lines.
    pub const fn reason(self) -> &'static str {
        match self {
            Self::Success => "collected",
            Self::NoDefenders => "no defenders deployed",
            Self::TooSoon => "collected too recently",
            Self::Unrecognized(_) => "unrecognized status",
        }
    }
}
