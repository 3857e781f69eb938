//! Request parameters and response types for the transport operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{BallKind, BonusStatus, CatchStatus, DeployStatus, EncounterStatus, ItemKind, LootStatus, Team};
use crate::ids::{CreatureId, LandmarkId, SpeciesId};
use crate::structs::{ItemStack, MAX_ATTRIBUTE};

/// How a capture ball is thrown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrowParameters {
    /// Size of the target reticle when released.
    pub normalized_reticle_size: f64,
    /// Spin applied to the ball.
    pub spin_modifier: f64,
    /// Where on the target the ball landed.
    pub normalized_hit_position: f64,
    /// Whether the ball hit the creature.
    pub hit_creature: bool,
}

impl Default for ThrowParameters {
    fn default() -> Self {
        Self {
            normalized_reticle_size: 1.95,
            spin_modifier: 1.0,
            normalized_hit_position: 1.0,
            hit_creature: true,
        }
    }
}

/// Attributes of a wild creature revealed by a successful encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WildCreature {
    /// Species of the creature.
    pub species: SpeciesId,
    /// Individual attack value.
    pub attack: u8,
    /// Individual defense value.
    pub defense: u8,
    /// Individual stamina value.
    pub stamina: u8,
    /// Combat power.
    pub cp: u32,
}

impl WildCreature {
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

/// Capture probability estimates per ball kind, in `0.0..=1.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaptureProbabilities(pub BTreeMap<BallKind, f64>);

impl CaptureProbabilities {
    /// Estimated probability for one ball kind.
    pub fn get(&self, ball: BallKind) -> Option<f64> {
        self.0.get(&ball).copied()
    }

    /// Whether the server sent no estimates at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Response to an encounter request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncounterResult {
    /// Encounter outcome.
    pub status: EncounterStatus,
    /// Revealed attributes, present on success.
    pub creature: Option<WildCreature>,
    /// Capture probability estimates, when the server provides them.
    pub probabilities: Option<CaptureProbabilities>,
}

/// Rewards for a successful capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureAward {
    /// Experience points.
    pub experience: u32,
    /// Candy for the species family.
    pub candy: u32,
    /// Stardust.
    pub stardust: u32,
}

/// Response to a capture throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureResult {
    /// Throw outcome.
    pub status: CatchStatus,
    /// Identity of the newly owned creature on success.
    pub captured: Option<CreatureId>,
    /// Rewards on success.
    pub award: CaptureAward,
}

/// Response to a loot request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootResult {
    /// Loot outcome.
    pub status: LootStatus,
    /// Experience points awarded.
    pub experience: u32,
    /// Items awarded.
    pub items: Vec<ItemStack>,
}

/// Details of a stronghold fetched before deploying.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrongholdInfo {
    /// Stronghold identifier.
    pub id: LandmarkId,
    /// Owning team; `None` or [`Team::Neutral`] when unowned.
    pub team: Option<Team>,
    /// Stronghold level; also its number of defender slots.
    pub level: u32,
    /// Number of creatures currently defending.
    pub occupants: u32,
    /// Whether one of the player's creatures already defends it.
    pub player_present: bool,
}

/// Response to a bonus collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusResult {
    /// Collection outcome.
    pub status: BonusStatus,
    /// Currency awarded.
    pub currency: u32,
    /// Stardust awarded.
    pub stardust: u32,
}

/// Response to a deployment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployResult {
    /// Deployment outcome.
    pub status: DeployStatus,
}

/// Rewards unlocked by reaching a level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelRewards {
    /// The level the rewards belong to.
    pub level: u32,
    /// Items awarded.
    pub items: Vec<ItemStack>,
    /// Item kinds that became available.
    pub unlocked: Vec<ItemKind>,
}
