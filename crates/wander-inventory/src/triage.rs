//! Classification of a raw inventory snapshot.
//!
//! [`triage`] is a single pass over the snapshot that produces every queue
//! the network side needs: trash to recycle, creatures to transfer, perfect
//! creatures to favorite, and eggs waiting for an incubator. It is a pure
//! function of its inputs, so re-running it on an unchanged snapshot yields
//! an identical result.

use core::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use wander_types::{
    BallKind, CreatureId, Egg, Incubator, IncubatorId, InventoryEntry, ItemKind, ItemStack,
    OwnedCreature, PlayerStats, SpeciesId,
};

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// One item kind to recycle down to a fixed stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashRule {
    /// Item to recycle.
    pub item: ItemKind,
    /// How many to keep; everything above is recycled.
    #[serde(default)]
    pub keep: u32,
}

/// What triage is allowed to queue for disposal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriageRules {
    /// Items to recycle.
    pub trash: Vec<TrashRule>,
    /// Whether surplus creatures may be transferred away.
    pub scrap: bool,
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// A trainer level increase detected between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    /// Level in the previous snapshot.
    pub from: u32,
    /// Level in this snapshot.
    pub to: u32,
}

/// The classified view of one inventory snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Triage {
    /// Capture-ball stock.
    pub balls: crate::balls::BallInventory,
    /// Every owned creature, in snapshot order.
    pub creatures: Vec<OwnedCreature>,
    /// The best individual of each species.
    pub best: BTreeMap<SpeciesId, OwnedCreature>,
    /// Item counts by kind.
    pub items: BTreeMap<ItemKind, u32>,
    /// Surplus items to recycle.
    pub trash: Vec<ItemStack>,
    /// Every egg, assigned or not.
    pub eggs: Vec<Egg>,
    /// Every incubator.
    pub incubators: Vec<Incubator>,
    /// Candy balances by species family.
    pub candy: BTreeMap<SpeciesId, u32>,
    /// Player progression, when the snapshot carried it.
    pub stats: Option<PlayerStats>,
    /// Set when the level rose since the previous snapshot.
    pub level_up: Option<LevelUp>,
    /// Items counting against storage.
    pub item_total: u32,
    /// Creatures and eggs counting against storage.
    pub creature_total: u32,
    /// Creatures to transfer away.
    pub disposal: Vec<CreatureId>,
    /// Perfect creatures not yet marked favorite.
    pub favorite: Vec<CreatureId>,
}

impl Triage {
    /// Whether `creature` is the retained best of its species.
    pub fn is_best(&self, creature: &OwnedCreature) -> bool {
        self.best
            .get(&creature.species)
            .is_some_and(|best| best.id == creature.id)
    }

    /// Look up an owned creature by id.
    pub fn creature(&self, id: CreatureId) -> Option<&OwnedCreature> {
        self.creatures.iter().find(|c| c.id == id)
    }
}

// ---------------------------------------------------------------------------
// Triage
// ---------------------------------------------------------------------------

/// Classify a raw snapshot.
///
/// `previous` is the stats snapshot from the last refresh, used only for
/// level-up detection.
pub fn triage(
    entries: &[InventoryEntry],
    rules: &TriageRules,
    previous: Option<&PlayerStats>,
) -> Triage {
    let mut out = Triage::default();

    for entry in entries {
        match entry {
            InventoryEntry::Item(stack) => {
                let count = out.items.entry(stack.item).or_insert(0);
                *count = count.saturating_add(stack.count);
                if stack.item.counts_toward_storage() {
                    out.item_total = out.item_total.saturating_add(stack.count);
                }
                if let Some(ball) = BallKind::from_item(stack.item) {
                    out.balls.add(ball, stack.count);
                }
            }
            InventoryEntry::Creature(creature) => {
                out.creatures.push(creature.clone());
                out.creature_total = out.creature_total.saturating_add(1);
            }
            InventoryEntry::Egg(egg) => {
                out.eggs.push(egg.clone());
                out.creature_total = out.creature_total.saturating_add(1);
            }
            InventoryEntry::Incubators(incubators) => {
                out.incubators.extend(incubators.iter().cloned());
            }
            InventoryEntry::Stats(stats) => out.stats = Some(stats.clone()),
            InventoryEntry::Candy { species, count } => {
                let balance = out.candy.entry(*species).or_insert(0);
                *balance = balance.saturating_add(*count);
            }
        }
    }

    out.best = best_per_species(&out.creatures);
    out.trash = surplus(&out.items, &rules.trash);
    out.level_up = match (previous, out.stats.as_ref()) {
        (Some(before), Some(now)) if now.level > before.level => Some(LevelUp {
            from: before.level,
            to: now.level,
        }),
        _ => None,
    };

    let mut favorite = BTreeSet::new();
    for creature in &out.creatures {
        if creature.is_perfect() && !creature.favorite && favorite.insert(creature.id) {
            out.favorite.push(creature.id);
        }
    }

    if rules.scrap {
        out.disposal = out
            .creatures
            .iter()
            .filter(|creature| !keeps(&out, creature))
            .map(|creature| creature.id)
            .collect();
    }

    tracing::debug!(
        creatures = out.creatures.len(),
        species = out.best.len(),
        eggs = out.eggs.len(),
        trash = out.trash.len(),
        disposal = out.disposal.len(),
        favorite = out.favorite.len(),
        "inventory triaged"
    );
    out
}

/// A creature survives disposal if it is the best of its species, a
/// favorite, perfect, or currently defending a stronghold.
fn keeps(triage: &Triage, creature: &OwnedCreature) -> bool {
    triage.is_best(creature)
        || creature.favorite
        || creature.is_perfect()
        || creature.deployed_at.is_some()
}

/// Ranking key: higher is better. Ties on every stat fall to the lowest id
/// so the choice is stable.
const fn rank(creature: &OwnedCreature) -> (u8, u32, u32, Reverse<CreatureId>) {
    (
        creature.score(),
        creature.cp,
        creature.stamina_max,
        Reverse(creature.id),
    )
}

/// The best individual of each species by score, then combat power, then
/// maximum stamina.
pub fn best_per_species(creatures: &[OwnedCreature]) -> BTreeMap<SpeciesId, OwnedCreature> {
    let mut best: BTreeMap<SpeciesId, OwnedCreature> = BTreeMap::new();
    for creature in creatures {
        match best.get(&creature.species) {
            Some(current) if rank(current) >= rank(creature) => {}
            _ => {
                best.insert(creature.species, creature.clone());
            }
        }
    }
    best
}

fn surplus(items: &BTreeMap<ItemKind, u32>, rules: &[TrashRule]) -> Vec<ItemStack> {
    let mut seen = BTreeSet::new();
    rules
        .iter()
        .filter(|rule| seen.insert(rule.item))
        .filter_map(|rule| {
            let held = items.get(&rule.item).copied().unwrap_or(0);
            let count = held.checked_sub(rule.keep).filter(|n| *n > 0)?;
            Some(ItemStack {
                item: rule.item,
                count,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Egg assignment
// ---------------------------------------------------------------------------

/// Pair free incubators with waiting eggs, shortest hatch distance first.
///
/// Greedy one-to-one: the `k`-th free incubator (in snapshot order) gets
/// the `k`-th shortest unassigned egg. Incubators with no uses left are
/// skipped.
pub fn assign_incubators(eggs: &[Egg], incubators: &[Incubator]) -> Vec<(IncubatorId, CreatureId)> {
    let mut waiting: Vec<&Egg> = eggs.iter().filter(|egg| egg.incubator.is_none()).collect();
    waiting.sort_by(|a, b| a.target_km.total_cmp(&b.target_km).then(a.id.cmp(&b.id)));

    incubators
        .iter()
        .filter(|incubator| incubator.egg.is_none() && incubator.uses_remaining != Some(0))
        .zip(waiting)
        .map(|(incubator, egg)| (incubator.id.clone(), egg.id))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wander_types::LandmarkId;

    use super::*;

    fn creature(id: u64, species: u16, ivs: (u8, u8, u8), cp: u32) -> OwnedCreature {
        OwnedCreature {
            id: CreatureId(id),
            species: SpeciesId(species),
            attack: ivs.0,
            defense: ivs.1,
            stamina: ivs.2,
            cp,
            stamina_current: 50,
            stamina_max: 50,
            favorite: false,
            deployed_at: None,
        }
    }

    fn scrap() -> TriageRules {
        TriageRules {
            trash: Vec::new(),
            scrap: true,
        }
    }

    fn snapshot(creatures: Vec<OwnedCreature>) -> Vec<InventoryEntry> {
        creatures.into_iter().map(InventoryEntry::Creature).collect()
    }

    fn egg(id: u64, km: f64, incubator: Option<&str>) -> Egg {
        Egg {
            id: CreatureId(id),
            target_km: km,
            incubator: incubator.map(IncubatorId::from),
        }
    }

    fn incubator(id: &str, egg: Option<u64>, uses: Option<u32>) -> Incubator {
        Incubator {
            id: IncubatorId::from(id),
            item: ItemKind::Incubator,
            egg: egg.map(CreatureId),
            uses_remaining: uses,
        }
    }

    #[test]
    fn perfect_one_is_best_and_the_others_are_scrapped() {
        // Scores 40, 45, 42 of one species.
        let entries = snapshot(vec![
            creature(1, 16, (14, 13, 13), 500),
            creature(2, 16, (15, 15, 15), 100),
            creature(3, 16, (14, 14, 14), 900),
        ]);
        let result = triage(&entries, &scrap(), None);
        assert_eq!(result.best.get(&SpeciesId(16)).unwrap().id, CreatureId(2));
        assert_eq!(result.disposal, vec![CreatureId(1), CreatureId(3)]);
        assert_eq!(result.favorite, vec![CreatureId(2)]);
    }

    #[test]
    fn ties_fall_through_cp_then_stamina() {
        let mut low_stamina = creature(1, 7, (10, 10, 10), 300);
        low_stamina.stamina_max = 40;
        let high_stamina = creature(2, 7, (10, 10, 10), 300);
        let weaker = creature(3, 7, (10, 10, 10), 299);
        let best = best_per_species(&[low_stamina, weaker, high_stamina]);
        assert_eq!(best.get(&SpeciesId(7)).unwrap().id, CreatureId(2));
    }

    #[test]
    fn triage_is_idempotent() {
        let entries = snapshot(vec![
            creature(1, 1, (3, 4, 5), 10),
            creature(2, 1, (3, 4, 5), 10),
            creature(3, 2, (9, 9, 9), 10),
        ]);
        let first = triage(&entries, &scrap(), None);
        let second = triage(&entries, &scrap(), None);
        assert_eq!(first, second);
        // Full tie resolves to the lower id.
        assert_eq!(first.best.get(&SpeciesId(1)).unwrap().id, CreatureId(1));
    }

    #[test]
    fn disposal_never_touches_protected_creatures() {
        let mut favorite = creature(2, 5, (1, 1, 1), 10);
        favorite.favorite = true;
        let mut deployed = creature(3, 5, (2, 2, 2), 10);
        deployed.deployed_at = Some(LandmarkId::from("gym"));
        let entries = snapshot(vec![
            creature(1, 5, (12, 12, 12), 900),
            favorite,
            deployed,
            creature(4, 5, (15, 15, 15), 5),
            creature(5, 5, (0, 0, 1), 5),
        ]);
        let result = triage(&entries, &scrap(), None);
        assert_eq!(result.disposal, vec![CreatureId(1), CreatureId(5)]);
        for id in &result.disposal {
            let c = result.creature(*id).unwrap();
            assert!(!c.favorite && !c.is_perfect() && !result.is_best(c));
            assert!(c.deployed_at.is_none());
        }
    }

    #[test]
    fn nothing_is_scrapped_without_permission() {
        let entries = snapshot(vec![creature(1, 5, (1, 1, 1), 1), creature(2, 5, (2, 2, 2), 2)]);
        let result = triage(&entries, &TriageRules::default(), None);
        assert!(result.disposal.is_empty());
    }

    #[test]
    fn favorited_perfect_creature_is_not_queued_again() {
        let mut perfect = creature(1, 5, (15, 15, 15), 1);
        perfect.favorite = true;
        let result = triage(&snapshot(vec![perfect]), &scrap(), None);
        assert!(result.favorite.is_empty());
    }

    #[test]
    fn trash_keeps_the_configured_stock() {
        let entries = vec![
            InventoryEntry::Item(ItemStack {
                item: ItemKind::Potion,
                count: 30,
            }),
            InventoryEntry::Item(ItemStack {
                item: ItemKind::Revive,
                count: 3,
            }),
            InventoryEntry::Item(ItemStack {
                item: ItemKind::PokeBall,
                count: 12,
            }),
            InventoryEntry::Item(ItemStack {
                item: ItemKind::IncubatorUnlimited,
                count: 1,
            }),
        ];
        let rules = TriageRules {
            trash: vec![
                TrashRule {
                    item: ItemKind::Potion,
                    keep: 10,
                },
                TrashRule {
                    item: ItemKind::Revive,
                    keep: 5,
                },
            ],
            scrap: false,
        };
        let result = triage(&entries, &rules, None);
        assert_eq!(
            result.trash,
            vec![ItemStack {
                item: ItemKind::Potion,
                count: 20
            }]
        );
        assert_eq!(result.balls.count(BallKind::Poke), 12);
        assert_eq!(result.item_total, 45);
    }

    #[test]
    fn trash_rules_parse_from_yaml() {
        let yaml = "- item: super_potion\n  keep: 20\n- item: razz_berry\n";
        let rules: Vec<TrashRule> = serde_yml::from_str(yaml).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules.first().unwrap().item, ItemKind::SuperPotion);
        assert_eq!(rules.get(1).unwrap().keep, 0);
    }

    #[test]
    fn level_up_is_detected_against_previous_stats() {
        let stats = |level| PlayerStats {
            level,
            experience: 0,
            km_walked: 0.0,
        };
        let entries = vec![InventoryEntry::Stats(stats(6))];
        let result = triage(&entries, &TriageRules::default(), Some(&stats(5)));
        assert_eq!(result.level_up, Some(LevelUp { from: 5, to: 6 }));
        let same = triage(&entries, &TriageRules::default(), Some(&stats(6)));
        assert_eq!(same.level_up, None);
        let first = triage(&entries, &TriageRules::default(), None);
        assert_eq!(first.level_up, None);
    }

    #[test]
    fn eggs_count_toward_creature_storage() {
        let entries = vec![
            InventoryEntry::Creature(creature(1, 1, (1, 1, 1), 1)),
            InventoryEntry::Egg(egg(2, 5.0, None)),
        ];
        let result = triage(&entries, &TriageRules::default(), None);
        assert_eq!(result.creature_total, 2);
        assert_eq!(result.creatures.len(), 1);
    }

    #[test]
    fn shortest_eggs_get_free_incubators_first() {
        let eggs = vec![
            egg(1, 10.0, None),
            egg(2, 2.0, None),
            egg(3, 5.0, None),
            egg(4, 1.0, Some("busy")),
        ];
        let incubators = vec![
            incubator("busy", Some(4), None),
            incubator("a", None, None),
            incubator("worn", None, Some(0)),
            incubator("b", None, Some(2)),
        ];
        let pairs = assign_incubators(&eggs, &incubators);
        assert_eq!(
            pairs,
            vec![
                (IncubatorId::from("a"), CreatureId(2)),
                (IncubatorId::from("b"), CreatureId(3)),
            ]
        );
    }

    #[test]
    fn more_incubators_than_eggs() {
        let pairs = assign_incubators(
            &[egg(1, 2.0, None)],
            &[incubator("a", None, None), incubator("b", None, None)],
        );
        assert_eq!(pairs, vec![(IncubatorId::from("a"), CreatureId(1))]);
    }
}
