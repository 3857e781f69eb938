//! Scripted session doubles for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use wander_types::{
    BallKind, BonusResult, BonusStatus, CaptureAward, CaptureResult, CatchStatus,
    CatchableCreature, Coordinate, CreatureId, DeployResult, DeployStatus, EncounterId,
    EncounterResult, EncounterStatus, HeartbeatPayload, IncubatorId, InventoryEntry, ItemKind,
    Landmark, LandmarkId, LandmarkKind, LevelRewards, LootResult, LootStatus, Profile,
    SpawnPointId, SpeciesId, StrongholdInfo, ThrowParameters,
};

use crate::catalog::StaticCatalog;
use crate::config::{BotConfig, Credentials};
use crate::context::SessionContext;
use crate::session::{Connector, Gateway, SessionClient, TransportError};

/// One recorded client call.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    SetPosition(Coordinate),
    Heartbeat,
    Encounter(EncounterId),
    Capture(EncounterId, BallKind),
    Loot(LandmarkId),
    Transfer(CreatureId),
    Recycle(ItemKind, u32),
    Incubate(IncubatorId, CreatureId),
    Favorite(CreatureId, bool),
    Profile,
    LevelRewards(u32),
    Inventory,
    Stronghold(LandmarkId),
    Deploy(LandmarkId, CreatureId),
    Bonus,
}

/// Queued responses. An empty queue falls back to a neutral answer.
#[derive(Debug, Default)]
pub(crate) struct Script {
    pub calls: Vec<Call>,
    pub positions: VecDeque<Result<(), TransportError>>,
    pub heartbeats: VecDeque<Result<HeartbeatPayload, TransportError>>,
    pub encounters: VecDeque<Result<EncounterResult, TransportError>>,
    pub captures: VecDeque<Result<CaptureResult, TransportError>>,
    pub loots: VecDeque<Result<LootResult, TransportError>>,
    pub strongholds: VecDeque<Result<StrongholdInfo, TransportError>>,
    pub deploys: VecDeque<DeployStatus>,
    pub bonuses: VecDeque<BonusStatus>,
    pub inventory: Vec<InventoryEntry>,
    pub profile: Profile,
    pub hang_heartbeat: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedClient {
    script: Arc<Mutex<Script>>,
}

impl ScriptedClient {
    pub fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script().calls.clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.script().calls.iter().filter(|call| matches(call)).count()
    }

    fn record(&self, call: Call) -> MutexGuard<'_, Script> {
        let mut script = self.script();
        script.calls.push(call);
        script
    }
}

impl SessionClient for ScriptedClient {
    async fn set_position(&mut self, at: Coordinate) -> Result<(), TransportError> {
        self.record(Call::SetPosition(at))
            .positions
            .pop_front()
            .unwrap_or(Ok(()))
    }

    async fn heartbeat(&mut self) -> Result<HeartbeatPayload, TransportError> {
        let hang = self.record(Call::Heartbeat).hang_heartbeat;
        if hang {
            core::future::pending::<()>().await;
        }
        self.script()
            .heartbeats
            .pop_front()
            .unwrap_or_else(|| Ok(HeartbeatPayload::default()))
    }

    async fn encounter(
        &mut self,
        creature: &CatchableCreature,
    ) -> Result<EncounterResult, TransportError> {
        self.record(Call::Encounter(creature.encounter_id))
            .encounters
            .pop_front()
            .unwrap_or(Ok(EncounterResult {
                status: EncounterStatus::NotFound,
                creature: None,
                probabilities: None,
            }))
    }

    async fn attempt_capture(
        &mut self,
        creature: &CatchableCreature,
        ball: BallKind,
        _throw: ThrowParameters,
    ) -> Result<CaptureResult, TransportError> {
        self.record(Call::Capture(creature.encounter_id, ball))
            .captures
            .pop_front()
            .unwrap_or(Ok(capture(CatchStatus::Error, None)))
    }

    async fn loot_landmark(
        &mut self,
        landmark: &LandmarkId,
        _at: Coordinate,
    ) -> Result<LootResult, TransportError> {
        self.record(Call::Loot(landmark.clone()))
            .loots
            .pop_front()
            .unwrap_or(Ok(LootResult {
                status: LootStatus::NoResult,
                experience: 0,
                items: Vec::new(),
            }))
    }

    async fn transfer_creature(&mut self, creature: CreatureId) -> Result<(), TransportError> {
        self.record(Call::Transfer(creature));
        Ok(())
    }

    async fn recycle_item(&mut self, item: ItemKind, count: u32) -> Result<(), TransportError> {
        self.record(Call::Recycle(item, count));
        Ok(())
    }

    async fn use_incubator(
        &mut self,
        incubator: &IncubatorId,
        egg: CreatureId,
    ) -> Result<(), TransportError> {
        self.record(Call::Incubate(incubator.clone(), egg));
        Ok(())
    }

    async fn set_favorite(
        &mut self,
        creature: CreatureId,
        favorite: bool,
    ) -> Result<(), TransportError> {
        self.record(Call::Favorite(creature, favorite));
        Ok(())
    }

    async fn fetch_profile(&mut self) -> Result<Profile, TransportError> {
        Ok(self.record(Call::Profile).profile.clone())
    }

    async fn fetch_level_rewards(&mut self, level: u32) -> Result<LevelRewards, TransportError> {
        self.record(Call::LevelRewards(level));
        Ok(LevelRewards {
            level,
            ..LevelRewards::default()
        })
    }

    async fn fetch_inventory(&mut self) -> Result<Vec<InventoryEntry>, TransportError> {
        Ok(self.record(Call::Inventory).inventory.clone())
    }

    async fn fetch_stronghold(
        &mut self,
        stronghold: &LandmarkId,
        _at: Coordinate,
    ) -> Result<StrongholdInfo, TransportError> {
        self.record(Call::Stronghold(stronghold.clone()))
            .strongholds
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Network(String::from("unscripted"))))
    }

    async fn deploy_creature(
        &mut self,
        stronghold: &LandmarkId,
        creature: CreatureId,
    ) -> Result<DeployResult, TransportError> {
        let status = self
            .record(Call::Deploy(stronghold.clone(), creature))
            .deploys
            .pop_front()
            .unwrap_or(DeployStatus::Unrecognized(-1));
        Ok(DeployResult { status })
    }

    async fn collect_bonus(&mut self) -> Result<BonusResult, TransportError> {
        let status = self
            .record(Call::Bonus)
            .bonuses
            .pop_front()
            .unwrap_or(BonusStatus::Success);
        Ok(BonusResult {
            status,
            currency: 10,
            stardust: 500,
        })
    }
}

/// Hands out clones of one scripted client; fails the first
/// `auth_failures` logins.
#[derive(Debug, Default)]
pub(crate) struct ScriptedConnector {
    pub client: ScriptedClient,
    pub auth_failures: u32,
    pub logins: Arc<AtomicU32>,
}

impl Connector for ScriptedConnector {
    type Client = ScriptedClient;

    async fn authenticate(
        &mut self,
        _credentials: &Credentials,
        _start: Coordinate,
    ) -> Result<ScriptedClient, TransportError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if self.auth_failures > 0 {
            self.auth_failures = self.auth_failures.saturating_sub(1);
            return Err(TransportError::Auth(String::from("scripted refusal")));
        }
        Ok(self.client.clone())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Gateway, config, and catalog bundled for engine tests.
pub(crate) struct Harness {
    pub client: ScriptedClient,
    pub gateway: Gateway<ScriptedClient>,
    pub config: BotConfig,
    pub catalog: StaticCatalog,
}

impl Harness {
    pub fn new(config: BotConfig) -> Self {
        let client = ScriptedClient::default();
        Self {
            gateway: Gateway::new(client.clone(), 60_000),
            client,
            config,
            catalog: StaticCatalog::default(),
        }
    }

    pub fn ctx(&self) -> SessionContext<'_, ScriptedClient> {
        SessionContext {
            gateway: &self.gateway,
            config: &self.config,
            catalog: &self.catalog,
        }
    }
}

pub(crate) fn catchable(encounter: u64, species: u16) -> CatchableCreature {
    CatchableCreature {
        species: SpeciesId(species),
        encounter_id: EncounterId(encounter),
        spawn_point: SpawnPointId::from("spawn"),
        lure: None,
    }
}

pub(crate) fn capture(status: CatchStatus, captured: Option<u64>) -> CaptureResult {
    CaptureResult {
        status,
        captured: captured.map(CreatureId),
        award: CaptureAward {
            experience: 100,
            candy: 3,
            stardust: 100,
        },
    }
}

pub(crate) fn loot_point(id: &str, at: Coordinate) -> Landmark {
    Landmark {
        id: LandmarkId::from(id),
        coordinate: at,
        kind: LandmarkKind::LootPoint,
        cooldown_until: None,
        lure: None,
        team: None,
    }
}
