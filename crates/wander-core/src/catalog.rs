//! Read-only reference data: display names for species and items.

use std::collections::BTreeMap;
use std::path::Path;

use wander_types::{ItemKind, SpeciesId};

use crate::config::ConfigError;

/// Display-name lookup used by log lines.
pub trait Catalog: Send + Sync {
    /// Display name of a species.
    fn species_name(&self, species: SpeciesId) -> String;

    /// Display name of an item kind.
    fn item_name(&self, item: ItemKind) -> String {
        builtin_item_name(item)
    }
}

/// A catalog backed by an in-memory species table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCatalog {
    species: BTreeMap<u16, String>,
}

impl StaticCatalog {
    /// Build from `(species number, name)` pairs.
    pub fn new(species: impl IntoIterator<Item = (u16, String)>) -> Self {
        Self {
            species: species.into_iter().collect(),
        }
    }

    /// Load a YAML map of species number to name.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a YAML map of species number to name.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let species: BTreeMap<u16, String> = serde_yml::from_str(yaml)?;
        Ok(Self { species })
    }

    /// Number of known species.
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// Whether no species are known.
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}

impl Catalog for StaticCatalog {
    fn species_name(&self, species: SpeciesId) -> String {
        self.species
            .get(&species.into_inner())
            .cloned()
            .unwrap_or_else(|| format!("species #{species}"))
    }
}

fn builtin_item_name(item: ItemKind) -> String {
    let name = match item {
        ItemKind::PokeBall => "Poke Ball",
        ItemKind::GreatBall => "Great Ball",
        ItemKind::UltraBall => "Ultra Ball",
        ItemKind::MasterBall => "Master Ball",
        ItemKind::Potion => "Potion",
        ItemKind::SuperPotion => "Super Potion",
        ItemKind::HyperPotion => "Hyper Potion",
        ItemKind::MaxPotion => "Max Potion",
        ItemKind::Revive => "Revive",
        ItemKind::MaxRevive => "Max Revive",
        ItemKind::LuckyEgg => "Lucky Egg",
        ItemKind::Incense => "Incense",
        ItemKind::LureModule => "Lure Module",
        ItemKind::RazzBerry => "Razz Berry",
        ItemKind::IncubatorUnlimited => "Egg Incubator (unlimited)",
        ItemKind::Incubator => "Egg Incubator",
        ItemKind::Unknown(code) => return format!("item #{code}"),
    };
    name.to_owned()
}
