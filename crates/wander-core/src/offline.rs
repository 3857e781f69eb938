//! A seeded, in-memory world that stands in for the remote service.
//!
//! [`OfflineConnector`] hands out [`OfflineClient`]s that share one
//! [`OfflineWorld`]. The world scatters loot points around its center,
//! spawns a few wild creatures on every heartbeat, hatches incubated eggs
//! as the player walks, and applies captures, loot, and transfers to its
//! own inventory. The same seed always produces the same world.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{TimeDelta, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};
use wander_types::{
    BallKind, BonusResult, BonusStatus, CaptureAward, CaptureProbabilities, CaptureResult,
    CatchStatus, CatchableCreature, Coordinate, CreatureId, DeployResult, DeployStatus, Egg,
    EncounterId, EncounterResult, EncounterStatus, HatchedEggs, HeartbeatPart, HeartbeatPayload,
    Incubator, IncubatorId, InventoryDelta, InventoryEntry, ItemKind, ItemStack, Landmark,
    LandmarkId, LandmarkKind, LevelRewards, LootResult, LootStatus, MAX_ATTRIBUTE, MapCell,
    MapObjects, NearbyCreature, OwnedCreature, PlayerStats, Profile, SpawnPointId, SpeciesId,
    StrongholdInfo, ThrowParameters, WildCreature,
};
use wander_world::distance_m;

use crate::config::Credentials;
use crate::session::{Connector, SessionClient, TransportError};

const LANDMARK_COUNT: usize = 8;
/// Half-width, in degrees, of the square landmarks are scattered over.
const SCATTER_DEG: f64 = 0.003;
const VISIBLE_M: f64 = 500.0;
const REACH_M: f64 = 40.0;
const LOOT_COOLDOWN_MINUTES: i64 = 5;
const SPECIES_POOL: u16 = 151;
const EXPERIENCE_PER_LEVEL: u64 = 1000;
const LOOT_TABLE: [ItemKind; 6] = [
    ItemKind::PokeBall,
    ItemKind::PokeBall,
    ItemKind::GreatBall,
    ItemKind::Potion,
    ItemKind::Revive,
    ItemKind::RazzBerry,
];

/// Complete state of the simulated service.
#[derive(Debug, Clone)]
pub struct OfflineWorld {
    rng: SmallRng,
    position: Coordinate,
    profile: Profile,
    stats: PlayerStats,
    creatures: Vec<OwnedCreature>,
    items: BTreeMap<ItemKind, u32>,
    eggs: Vec<Egg>,
    incubated_km: BTreeMap<CreatureId, f64>,
    incubators: Vec<Incubator>,
    landmarks: Vec<Landmark>,
    wild: Vec<(CatchableCreature, WildCreature)>,
    hatched: Vec<CreatureId>,
    next_id: u64,
}

impl OfflineWorld {
    /// A fresh world around `center`.
    pub fn new(seed: u64, center: Coordinate) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);
        let landmarks = (0..LANDMARK_COUNT)
            .map(|n| Landmark {
                id: LandmarkId::from(format!("offline-{n}")),
                coordinate: Coordinate::new(
                    center.latitude + rng.random_range(-SCATTER_DEG..SCATTER_DEG),
                    center.longitude + rng.random_range(-SCATTER_DEG..SCATTER_DEG),
                ),
                kind: LandmarkKind::LootPoint,
                cooldown_until: None,
                lure: None,
                team: None,
            })
            .collect();

        Self {
            rng,
            position: center,
            profile: Profile {
                username: String::from("offline"),
                creature_storage: 250,
                item_storage: 350,
                team: None,
                currencies: BTreeMap::from([(String::from("coins"), 0)]),
            },
            stats: PlayerStats {
                level: 1,
                experience: 0,
                km_walked: 0.0,
            },
            creatures: Vec::new(),
            items: BTreeMap::from([
                (ItemKind::PokeBall, 20),
                (ItemKind::GreatBall, 5),
                (ItemKind::Potion, 10),
                (ItemKind::IncubatorUnlimited, 1),
            ]),
            eggs: vec![Egg {
                id: CreatureId(1),
                target_km: 2.0,
                incubator: None,
            }],
            incubated_km: BTreeMap::new(),
            incubators: vec![Incubator {
                id: IncubatorId::from("offline-incubator"),
                item: ItemKind::IncubatorUnlimited,
                egg: None,
                uses_remaining: None,
            }],
            landmarks,
            wild: Vec::new(),
            hatched: Vec::new(),
            next_id: 100,
        }
    }

    /// Landmarks the world was seeded with.
    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    /// Creatures the player currently owns.
    pub fn creatures(&self) -> &[OwnedCreature] {
        &self.creatures
    }

    fn next_id(&mut self) -> u64 {
        self.next_id = self.next_id.saturating_add(1);
        self.next_id
    }

    fn item_total(&self) -> u32 {
        self.items
            .iter()
            .filter(|(item, _)| item.counts_toward_storage())
            .fold(0_u32, |total, (_, count)| total.saturating_add(*count))
    }

    fn add_item(&mut self, item: ItemKind, count: u32) {
        let stock = self.items.entry(item).or_insert(0);
        *stock = stock.saturating_add(count);
    }

    fn gain_experience(&mut self, amount: u32) {
        self.stats.experience = self.stats.experience.saturating_add(u64::from(amount));
        let earned = self
            .stats
            .experience
            .checked_div(EXPERIENCE_PER_LEVEL)
            .unwrap_or(0);
        self.stats.level = u32::try_from(earned).unwrap_or(u32::MAX).saturating_add(1);
    }

    const fn ball_probability(ball: BallKind) -> f64 {
        match ball {
            BallKind::Poke => 0.35,
            BallKind::Great => 0.55,
            BallKind::Ultra => 0.75,
            BallKind::Master => 1.0,
        }
    }

    fn move_to(&mut self, at: Coordinate) {
        let km = distance_m(self.position, at) / 1000.0;
        self.position = at;
        self.stats.km_walked += km;

        let mut ready = Vec::new();
        for (egg, walked) in &mut self.incubated_km {
            *walked += km;
            let target = self
                .eggs
                .iter()
                .find(|e| e.id == *egg)
                .map_or(f64::INFINITY, |e| e.target_km);
            if *walked >= target {
                ready.push(*egg);
            }
        }
        for egg in ready {
            self.hatch(egg);
        }
    }

    fn hatch(&mut self, egg: CreatureId) {
        self.incubated_km.remove(&egg);
        self.eggs.retain(|e| e.id != egg);
        for incubator in &mut self.incubators {
            if incubator.egg == Some(egg) {
                incubator.egg = None;
            }
        }
        let creature = self.random_creature(egg);
        self.creatures.push(creature);
        self.hatched.push(egg);
        debug!(creature = %egg, "offline egg hatched");
    }

    fn random_creature(&mut self, id: CreatureId) -> OwnedCreature {
        let stamina = self.rng.random_range(0..=MAX_ATTRIBUTE);
        OwnedCreature {
            id,
            species: SpeciesId(self.rng.random_range(1..=SPECIES_POOL)),
            attack: self.rng.random_range(0..=MAX_ATTRIBUTE),
            defense: self.rng.random_range(0..=MAX_ATTRIBUTE),
            stamina,
            cp: self.rng.random_range(10..=1500),
            stamina_current: u32::from(stamina).saturating_add(10),
            stamina_max: u32::from(stamina).saturating_add(10),
            favorite: false,
            deployed_at: None,
        }
    }

    fn spawn(&mut self) -> (CatchableCreature, WildCreature) {
        let id = self.next_id();
        let wild = WildCreature {
            species: SpeciesId(self.rng.random_range(1..=SPECIES_POOL)),
            attack: self.rng.random_range(0..=MAX_ATTRIBUTE),
            defense: self.rng.random_range(0..=MAX_ATTRIBUTE),
            stamina: self.rng.random_range(0..=MAX_ATTRIBUTE),
            cp: self.rng.random_range(10..=1500),
        };
        let catchable = CatchableCreature {
            species: wild.species,
            encounter_id: EncounterId(id),
            spawn_point: SpawnPointId::from(format!("spawn-{id}")),
            lure: None,
        };
        (catchable, wild)
    }

    fn heartbeat(&mut self) -> HeartbeatPayload {
        let count = self.rng.random_range(0..=2_u8);
        let mut wild = Vec::new();
        for _ in 0..count {
            wild.push(self.spawn());
        }
        self.wild = wild;

        let nearby = if self.rng.random_bool(0.3) {
            vec![NearbyCreature {
                species: SpeciesId(self.rng.random_range(1..=SPECIES_POOL)),
                distance_m: Some(self.rng.random_range(50.0..200.0)),
            }]
        } else {
            Vec::new()
        };
        let cell = MapCell {
            landmarks: self
                .landmarks
                .iter()
                .filter(|l| distance_m(self.position, l.coordinate) <= VISIBLE_M)
                .cloned()
                .collect(),
            catchable: self.wild.iter().map(|(c, _)| c.clone()).collect(),
            nearby,
        };

        let mut parts = vec![HeartbeatPart::MapObjects(MapObjects { cells: vec![cell] })];
        if !self.hatched.is_empty() {
            parts.push(HeartbeatPart::HatchedEggs(HatchedEggs {
                creature_ids: core::mem::take(&mut self.hatched),
                experience: 200,
                candy: 5,
                stardust: 400,
            }));
            parts.push(HeartbeatPart::InventoryDelta(InventoryDelta {
                entries: self.inventory(),
            }));
        }
        HeartbeatPayload { parts }
    }

    fn encounter(&self, target: &CatchableCreature) -> EncounterResult {
        let Some((_, wild)) = self.wild.iter().find(|(c, _)| c.encounter_id == target.encounter_id)
        else {
            return EncounterResult {
                status: EncounterStatus::NotFound,
                creature: None,
                probabilities: None,
            };
        };
        let stored = u32::try_from(self.creatures.len()).unwrap_or(u32::MAX);
        if stored >= self.profile.creature_storage {
            return EncounterResult {
                status: EncounterStatus::InventoryFull,
                creature: None,
                probabilities: None,
            };
        }
        let probabilities = BallKind::ALL
            .iter()
            .map(|ball| (*ball, Self::ball_probability(*ball)))
            .collect();
        EncounterResult {
            status: EncounterStatus::Success,
            creature: Some(*wild),
            probabilities: Some(CaptureProbabilities(probabilities)),
        }
    }

    fn capture(&mut self, target: &CatchableCreature, ball: BallKind) -> CaptureResult {
        let failed = CaptureResult {
            status: CatchStatus::Error,
            captured: None,
            award: CaptureAward::default(),
        };
        let Some(stock) = self.items.get_mut(&ball.item()).filter(|stock| **stock > 0) else {
            return failed;
        };
        let Some(position) = self
            .wild
            .iter()
            .position(|(c, _)| c.encounter_id == target.encounter_id)
        else {
            return failed;
        };
        *stock = stock.saturating_sub(1);

        if self.rng.random_bool(Self::ball_probability(ball)) {
            let (_, wild) = self.wild.remove(position);
            let id = CreatureId(self.next_id());
            self.creatures.push(OwnedCreature {
                id,
                species: wild.species,
                attack: wild.attack,
                defense: wild.defense,
                stamina: wild.stamina,
                cp: wild.cp,
                stamina_current: u32::from(wild.stamina).saturating_add(10),
                stamina_max: u32::from(wild.stamina).saturating_add(10),
                favorite: false,
                deployed_at: None,
            });
            let award = CaptureAward {
                experience: 100,
                candy: 3,
                stardust: 100,
            };
            self.gain_experience(award.experience);
            return CaptureResult {
                status: CatchStatus::Success,
                captured: Some(id),
                award,
            };
        }
        let status = if self.rng.random_bool(0.2) {
            self.wild.remove(position);
            CatchStatus::Flee
        } else {
            CatchStatus::Escape
        };
        CaptureResult {
            status,
            captured: None,
            award: CaptureAward::default(),
        }
    }

    fn loot(&mut self, id: &LandmarkId) -> LootResult {
        let now = Utc::now();
        let nothing = |status| LootResult {
            status,
            experience: 0,
            items: Vec::new(),
        };
        let position = self.position;
        let full = self.item_total() >= self.profile.item_storage;
        let Some(landmark) = self.landmarks.iter_mut().find(|l| l.id == *id) else {
            return nothing(LootStatus::NoResult);
        };
        if distance_m(position, landmark.coordinate) > REACH_M {
            return nothing(LootStatus::OutOfRange);
        }
        if landmark.cooldown_until.is_some_and(|until| until > now) {
            return nothing(LootStatus::InCooldown);
        }
        if full {
            return nothing(LootStatus::InventoryFull);
        }
        landmark.cooldown_until = now.checked_add_signed(TimeDelta::minutes(LOOT_COOLDOWN_MINUTES));

        let mut items: Vec<ItemStack> = Vec::new();
        for _ in 0..3 {
            let pick = LOOT_TABLE
                .get(self.rng.random_range(0..LOOT_TABLE.len()))
                .copied()
                .unwrap_or(ItemKind::PokeBall);
            self.add_item(pick, 1);
            match items.iter_mut().find(|stack| stack.item == pick) {
                Some(stack) => stack.count = stack.count.saturating_add(1),
                None => items.push(ItemStack {
                    item: pick,
                    count: 1,
                }),
            }
        }
        self.gain_experience(50);
        LootResult {
            status: LootStatus::Success,
            experience: 50,
            items,
        }
    }

    fn transfer(&mut self, id: CreatureId) -> Result<(), TransportError> {
        let before = self.creatures.len();
        self.creatures.retain(|c| c.id != id);
        if self.creatures.len() == before {
            return Err(TransportError::Network(format!("unknown creature {id}")));
        }
        Ok(())
    }

    fn recycle(&mut self, item: ItemKind, count: u32) -> Result<(), TransportError> {
        match self.items.get_mut(&item) {
            Some(stock) if *stock >= count => {
                *stock = stock.saturating_sub(count);
                Ok(())
            }
            _ => Err(TransportError::Network(format!("not enough {item:?} to recycle"))),
        }
    }

    fn incubate(&mut self, incubator: &IncubatorId, egg: CreatureId) -> Result<(), TransportError> {
        let Some(slot) = self
            .incubators
            .iter_mut()
            .find(|slot| slot.id == *incubator && slot.egg.is_none())
        else {
            return Err(TransportError::Network(format!("incubator {incubator} unavailable")));
        };
        let Some(waiting) = self.eggs.iter_mut().find(|e| e.id == egg) else {
            return Err(TransportError::Network(format!("unknown egg {egg}")));
        };
        slot.egg = Some(egg);
        waiting.incubator = Some(incubator.clone());
        self.incubated_km.insert(egg, 0.0);
        Ok(())
    }

    fn favorite(&mut self, id: CreatureId, favorite: bool) -> Result<(), TransportError> {
        let Some(creature) = self.creatures.iter_mut().find(|c| c.id == id) else {
            return Err(TransportError::Network(format!("unknown creature {id}")));
        };
        creature.favorite = favorite;
        Ok(())
    }

    fn inventory(&self) -> Vec<InventoryEntry> {
        let mut entries: Vec<InventoryEntry> = self
            .items
            .iter()
            .map(|(item, count)| {
                InventoryEntry::Item(ItemStack {
                    item: *item,
                    count: *count,
                })
            })
            .collect();
        entries.extend(self.creatures.iter().cloned().map(InventoryEntry::Creature));
        entries.extend(self.eggs.iter().cloned().map(InventoryEntry::Egg));
        entries.push(InventoryEntry::Incubators(self.incubators.clone()));
        entries.push(InventoryEntry::Stats(self.stats.clone()));
        entries
    }
}

// ---------------------------------------------------------------------------
// Client and connector
// ---------------------------------------------------------------------------

/// A session against an [`OfflineWorld`].
#[derive(Debug, Clone)]
pub struct OfflineClient {
    world: Arc<Mutex<OfflineWorld>>,
}

impl OfflineClient {
    fn world(&self) -> Result<MutexGuard<'_, OfflineWorld>, TransportError> {
        self.world
            .lock()
            .map_err(|poisoned| TransportError::Network(poisoned.to_string()))
    }
}

impl SessionClient for OfflineClient {
    async fn set_position(&mut self, at: Coordinate) -> Result<(), TransportError> {
        self.world()?.move_to(at);
        Ok(())
    }

    async fn heartbeat(&mut self) -> Result<HeartbeatPayload, TransportError> {
        Ok(self.world()?.heartbeat())
    }

    async fn encounter(
        &mut self,
        creature: &CatchableCreature,
    ) -> Result<EncounterResult, TransportError> {
        Ok(self.world()?.encounter(creature))
    }

    async fn attempt_capture(
        &mut self,
        creature: &CatchableCreature,
        ball: BallKind,
        _throw: ThrowParameters,
    ) -> Result<CaptureResult, TransportError> {
        Ok(self.world()?.capture(creature, ball))
    }

    async fn loot_landmark(
        &mut self,
        landmark: &LandmarkId,
        _at: Coordinate,
    ) -> Result<LootResult, TransportError> {
        Ok(self.world()?.loot(landmark))
    }

    async fn transfer_creature(&mut self, creature: CreatureId) -> Result<(), TransportError> {
        self.world()?.transfer(creature)
    }

    async fn recycle_item(&mut self, item: ItemKind, count: u32) -> Result<(), TransportError> {
        self.world()?.recycle(item, count)
    }

    async fn use_incubator(
        &mut self,
        incubator: &IncubatorId,
        egg: CreatureId,
    ) -> Result<(), TransportError> {
        self.world()?.incubate(incubator, egg)
    }

    async fn set_favorite(
        &mut self,
        creature: CreatureId,
        favorite: bool,
    ) -> Result<(), TransportError> {
        self.world()?.favorite(creature, favorite)
    }

    async fn fetch_profile(&mut self) -> Result<Profile, TransportError> {
        Ok(self.world()?.profile.clone())
    }

    async fn fetch_level_rewards(&mut self, level: u32) -> Result<LevelRewards, TransportError> {
        let mut world = self.world()?;
        world.add_item(ItemKind::PokeBall, 10);
        Ok(LevelRewards {
            level,
            items: vec![ItemStack {
                item: ItemKind::PokeBall,
                count: 10,
            }],
            unlocked: Vec::new(),
        })
    }

    async fn fetch_inventory(&mut self) -> Result<Vec<InventoryEntry>, TransportError> {
        Ok(self.world()?.inventory())
    }

    async fn fetch_stronghold(
        &mut self,
        stronghold: &LandmarkId,
        _at: Coordinate,
    ) -> Result<StrongholdInfo, TransportError> {
        Err(TransportError::Network(format!("no stronghold {stronghold}")))
    }

    async fn deploy_creature(
        &mut self,
        _stronghold: &LandmarkId,
        _creature: CreatureId,
    ) -> Result<DeployResult, TransportError> {
        Ok(DeployResult {
            status: DeployStatus::NotInRange,
        })
    }

    async fn collect_bonus(&mut self) -> Result<BonusResult, TransportError> {
        Ok(BonusResult {
            status: BonusStatus::NoDefenders,
            currency: 0,
            stardust: 0,
        })
    }
}

/// Opens sessions against a shared [`OfflineWorld`].
#[derive(Debug, Clone)]
pub struct OfflineConnector {
    world: Arc<Mutex<OfflineWorld>>,
}

impl OfflineConnector {
    /// A connector over a fresh world seeded with `seed` around `center`.
    pub fn new(seed: u64, center: Coordinate) -> Self {
        Self {
            world: Arc::new(Mutex::new(OfflineWorld::new(seed, center))),
        }
    }

    /// Shared handle to the world, for inspection.
    pub fn world(&self) -> Arc<Mutex<OfflineWorld>> {
        Arc::clone(&self.world)
    }
}

impl Connector for OfflineConnector {
    type Client = OfflineClient;

    async fn authenticate(
        &mut self,
        credentials: &Credentials,
        start: Coordinate,
    ) -> Result<OfflineClient, TransportError> {
        let client = OfflineClient {
            world: Arc::clone(&self.world),
        };
        client.world()?.move_to(start);
        info!(
            username = %credentials.username,
            provider = %credentials.provider,
            %start,
            "offline session opened"
        );
        Ok(client)
    }
}
