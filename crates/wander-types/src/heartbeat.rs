//! Heartbeat payload delivered once per location cycle.
//!
//! A heartbeat bundles several independent sub-results. Each
//! [`HeartbeatPart`] is tagged by kind; the dispatcher routes on that tag
//! and logs anything it does not recognise.

use serde::{Deserialize, Serialize};

use crate::ids::{CreatureId, SpeciesId};
use crate::structs::{CatchableCreature, InventoryEntry, Landmark, NearbyCreature, Profile};

/// Multi-part response to one heartbeat request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    /// Sub-results in server order.
    pub parts: Vec<HeartbeatPart>,
}

/// One typed sub-result of a heartbeat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeartbeatPart {
    /// World state around the player.
    MapObjects(MapObjects),
    /// Eggs that hatched since the last heartbeat.
    HatchedEggs(HatchedEggs),
    /// Candy earned by walking with the buddy creature.
    BuddyCandy(BuddyCandy),
    /// Inventory snapshot.
    InventoryDelta(InventoryDelta),
    /// Badges awarded since the last heartbeat.
    Badges(Badges),
    /// Player profile.
    PlayerProfile(Profile),
    /// Remote settings digest.
    RemoteSettings(RemoteSettings),
    /// A part kind this engine does not know.
    Unknown {
        /// The server's kind tag.
        kind: String,
    },
}

impl HeartbeatPart {
    /// Kind tag used in log lines.
    pub fn kind(&self) -> &str {
        match self {
            Self::MapObjects(_) => "map_objects",
            Self::HatchedEggs(_) => "hatched_eggs",
            Self::BuddyCandy(_) => "buddy_candy",
            Self::InventoryDelta(_) => "inventory_delta",
            Self::Badges(_) => "badges",
            Self::PlayerProfile(_) => "player_profile",
            Self::RemoteSettings(_) => "remote_settings",
            Self::Unknown { kind } => kind.as_str(),
        }
    }
}

/// World state around the player, split into map cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapObjects {
    /// Cells in server order.
    pub cells: Vec<MapCell>,
}

impl MapObjects {
    /// All landmarks across every cell.
    pub fn landmarks(&self) -> impl Iterator<Item = &Landmark> {
        self.cells.iter().flat_map(|cell| cell.landmarks.iter())
    }

    /// All catchable creatures across every cell.
    pub fn catchable(&self) -> impl Iterator<Item = &CatchableCreature> {
        self.cells.iter().flat_map(|cell| cell.catchable.iter())
    }

    /// All visible but out-of-range creatures across every cell.
    pub fn nearby(&self) -> impl Iterator<Item = &NearbyCreature> {
        self.cells.iter().flat_map(|cell| cell.nearby.iter())
    }

    /// Append the cells of another map-objects part.
    pub fn merge(&mut self, other: Self) {
        self.cells.extend(other.cells);
    }
}

/// One map cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapCell {
    /// Landmarks in the cell.
    pub landmarks: Vec<Landmark>,
    /// Creatures close enough to encounter.
    pub catchable: Vec<CatchableCreature>,
    /// Creatures visible but too far to encounter.
    pub nearby: Vec<NearbyCreature>,
}

/// Hatch notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HatchedEggs {
    /// Identities of the newly hatched creatures.
    pub creature_ids: Vec<CreatureId>,
    /// Experience awarded.
    pub experience: u32,
    /// Candy awarded.
    pub candy: u32,
    /// Stardust awarded.
    pub stardust: u32,
}

/// Buddy candy notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuddyCandy {
    /// Buddy species.
    pub species: SpeciesId,
    /// Candy earned.
    pub candy: u32,
}

/// Full inventory snapshot carried by a heartbeat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InventoryDelta {
    /// Every inventory record.
    pub entries: Vec<InventoryEntry>,
}

/// Badge notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badges {
    /// Awarded badges.
    pub awards: Vec<BadgeAward>,
}

/// One awarded badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeAward {
    /// Badge name.
    pub badge: String,
    /// Badge tier reached.
    pub level: u32,
}

/// Remote settings digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Settings version hash.
    pub hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_part_keeps_its_tag() {
        let part = HeartbeatPart::Unknown {
            kind: String::from("weather"),
        };
        assert_eq!(part.kind(), "weather");
    }

    #[test]
    fn payload_deserializes_from_json() {
        let json = r#"{"parts":[{"remote_settings":{"hash":"abc"}},{"unknown":{"kind":"x"}}]}"#;
        let payload: HeartbeatPayload = serde_json::from_str(json).unwrap_or_default();
        assert_eq!(payload.parts.len(), 2);
        assert_eq!(payload.parts.first().map(HeartbeatPart::kind), Some("remote_settings"));
    }
}
