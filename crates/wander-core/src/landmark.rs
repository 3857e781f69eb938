//! Landmark engine: classification, looting, and stronghold visits.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};
use wander_inventory::Triage;
use wander_types::{
    BonusStatus, CatchableCreature, Coordinate, CreatureId, DeployStatus, ItemStack, Landmark,
    LandmarkKind, LootStatus, SpawnPointId, StrongholdInfo, Team,
};
use wander_world::distance_m;

use crate::context::{SessionContext, pause};
use crate::inventory::{self, InventoryState};
use crate::session::SessionClient;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Landmarks around the player, split by what can be done with them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classified {
    /// Loot points in range and off cooldown.
    pub loot: Vec<Landmark>,
    /// Loot points in range but still cooling down.
    pub cooling: Vec<Landmark>,
    /// Strongholds in range.
    pub strongholds: Vec<Landmark>,
    /// Creatures attracted by active lures in range.
    pub lured: Vec<CatchableCreature>,
    /// Landmarks reported but beyond the interaction radius.
    pub out_of_range: usize,
}

/// Classify landmarks relative to `position`. A landmark id seen twice is
/// only considered once.
pub fn classify<'a>(
    landmarks: impl IntoIterator<Item = &'a Landmark>,
    position: Coordinate,
    radius_m: f64,
    now: DateTime<Utc>,
) -> Classified {
    let mut seen = BTreeSet::new();
    let mut out = Classified::default();

    for landmark in landmarks {
        if !seen.insert(landmark.id.clone()) {
            continue;
        }
        if distance_m(position, landmark.coordinate) > radius_m {
            out.out_of_range = out.out_of_range.saturating_add(1);
            continue;
        }
        if let Some(lure) = landmark.lure.as_ref().filter(|lure| lure.expires_at > now) {
            out.lured.push(CatchableCreature {
                species: lure.species,
                encounter_id: lure.encounter_id,
                spawn_point: SpawnPointId::from(landmark.id.as_str()),
                lure: Some(landmark.id.clone()),
            });
        }
        match landmark.kind {
            LandmarkKind::LootPoint => {
                if landmark.cooldown_until.is_some_and(|until| until > now) {
                    out.cooling.push(landmark.clone());
                } else {
                    out.loot.push(landmark.clone());
                }
            }
            LandmarkKind::Stronghold => out.strongholds.push(landmark.clone()),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Looting
// ---------------------------------------------------------------------------

/// What one looting pass achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LootSummary {
    /// Landmarks looted successfully.
    pub looted: u32,
    /// Experience awarded.
    pub experience: u32,
    /// Items awarded, merged by kind.
    pub items: Vec<ItemStack>,
    /// Whether item storage filled up during the pass.
    pub inventory_full: bool,
}

impl LootSummary {
    fn add_items(&mut self, awarded: &[ItemStack]) {
        for stack in awarded {
            match self.items.iter_mut().find(|s| s.item == stack.item) {
                Some(existing) => existing.count = existing.count.saturating_add(stack.count),
                None => self.items.push(*stack),
            }
        }
    }
}

/// Loot each eligible landmark in turn.
pub async fn loot_all<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
    loot: &[Landmark],
) -> LootSummary {
    let mut summary = LootSummary::default();
    let max_attempts = ctx.config.landmarks.max_attempts;

    for (position, landmark) in loot.iter().enumerate() {
        if position > 0 {
            pause(ctx.config.landmarks.loot_wait()).await;
        }

        let mut attempts: u32 = 0;
        let result = loop {
            attempts = attempts.saturating_add(1);
            match ctx.gateway.loot_landmark(&landmark.id, landmark.coordinate).await {
                Ok(result) => break Some(result),
                Err(err) if attempts < max_attempts => {
                    warn!(error = %err, landmark = %landmark.id, attempts, "loot failed, retrying");
                    pause(ctx.config.pacing.retry_wait()).await;
                }
                Err(err) => {
                    warn!(error = %err, landmark = %landmark.id, attempts, "loot failed, skipping");
                    break None;
                }
            }
        };
        let Some(result) = result else {
            continue;
        };

        match result.status {
            LootStatus::Success => {
                summary.looted = summary.looted.saturating_add(1);
                summary.experience = summary.experience.saturating_add(result.experience);
                summary.add_items(&result.items);
                info!(
                    outcome = "success",
                    landmark = %landmark.id,
                    experience = result.experience,
                    "looted"
                );
                for stack in &result.items {
                    info!(
                        "acquired {}x {}",
                        stack.count,
                        ctx.catalog.item_name(stack.item)
                    );
                }
            }
            LootStatus::InventoryFull => {
                warn!(landmark = %landmark.id, reason = result.status.reason(), "loot refused");
                if !summary.inventory_full {
                    summary.inventory_full = true;
                    make_item_room(ctx, state).await;
                }
            }
            LootStatus::Unrecognized(code) => {
                warn!(landmark = %landmark.id, code, "unrecognized loot status");
            }
            status => info!(landmark = %landmark.id, reason = status.reason(), "nothing looted"),
        }
    }
    summary
}

async fn make_item_room<C: SessionClient>(ctx: SessionContext<'_, C>, state: &mut InventoryState) {
    if let Err(err) = inventory::refresh(ctx, state).await {
        warn!(error = %err, "inventory refresh failed");
        return;
    }
    let recycled = inventory::recycle_trash(ctx, state).await;
    if recycled == 0 {
        warn!("item storage full and nothing on the trash list to recycle");
    }
}

// ---------------------------------------------------------------------------
// Strongholds
// ---------------------------------------------------------------------------

/// When the defender bonus was last collected. Survives session restarts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrongholdLedger {
    last_bonus_at: Option<Instant>,
}

impl StrongholdLedger {
    /// Whether `interval` has passed since the last collection.
    pub fn bonus_due(&self, now: Instant, interval: Duration) -> bool {
        self.last_bonus_at
            .is_none_or(|last| now.saturating_duration_since(last) >= interval)
    }

    /// Remember a collection at `now`.
    pub const fn record_bonus(&mut self, now: Instant) {
        self.last_bonus_at = Some(now);
    }
}

/// What one stronghold pass achieved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrongholdSummary {
    /// Creatures deployed.
    pub deployed: u32,
    /// Bonus collections that succeeded.
    pub bonuses: u32,
}

/// Why a stronghold cannot take a defender.
pub fn deploy_gate(info: &StrongholdInfo, player_team: Option<Team>) -> Result<(), &'static str> {
    let Some(team) = player_team.filter(|team| *team != Team::Neutral) else {
        return Err("no team chosen");
    };
    if info.team.is_some_and(|owner| owner != Team::Neutral && owner != team) {
        return Err("owned by another team");
    }
    if info.occupants >= info.level {
        return Err("no free slot");
    }
    if info.player_present {
        return Err("already defending");
    }
    Ok(())
}

/// The highest-cp retained creature that is neither favorite nor deployed.
pub fn pick_defender(triage: &Triage) -> Option<CreatureId> {
    triage
        .best
        .values()
        .filter(|c| !c.favorite && c.deployed_at.is_none())
        .max_by(|a, b| a.cp.cmp(&b.cp).then(b.id.cmp(&a.id)))
        .map(|c| c.id)
}

/// Deploy to eligible strongholds and collect the defender bonus when due.
pub async fn visit_strongholds<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
    ledger: &mut StrongholdLedger,
    strongholds: &[Landmark],
) -> StrongholdSummary {
    let settings = &ctx.config.landmarks.strongholds;
    let mut summary = StrongholdSummary::default();
    if !settings.enabled {
        return summary;
    }
    if state.level() < settings.min_player_level {
        debug!(
            level = state.level(),
            min_level = settings.min_player_level,
            "below stronghold level"
        );
        return summary;
    }

    for stronghold in strongholds {
        let info = match ctx
            .gateway
            .fetch_stronghold(&stronghold.id, stronghold.coordinate)
            .await
        {
            Ok(info) => info,
            Err(err) => {
                warn!(error = %err, stronghold = %stronghold.id, "stronghold details unavailable");
                continue;
            }
        };
        if let Err(reason) = deploy_gate(&info, state.profile.team) {
            debug!(stronghold = %stronghold.id, reason, "not deploying");
            continue;
        }
        let Some(defender) = pick_defender(&state.triage) else {
            debug!("no creature available to deploy");
            break;
        };

        pause(ctx.config.pacing.call_wait()).await;
        match ctx.gateway.deploy_creature(&stronghold.id, defender).await {
            Ok(result) if result.status == DeployStatus::Success => {
                state.mark_deployed(defender, &stronghold.id);
                summary.deployed = summary.deployed.saturating_add(1);
                info!(
                    outcome = "success",
                    stronghold = %stronghold.id,
                    creature = %defender,
                    "deployed defender"
                );
                if collect_bonus(ctx, ledger).await {
                    summary.bonuses = summary.bonuses.saturating_add(1);
                }
            }
            Ok(result) => info!(
                stronghold = %stronghold.id,
                reason = result.status.reason(),
                "deployment refused"
            ),
            Err(err) => warn!(error = %err, stronghold = %stronghold.id, "deployment failed"),
        }
    }

    let interval = Duration::from_secs(settings.bonus_interval_secs);
    if state.has_deployed()
        && ledger.bonus_due(Instant::now(), interval)
        && collect_bonus(ctx, ledger).await
    {
        summary.bonuses = summary.bonuses.saturating_add(1);
    }
    summary
}

async fn collect_bonus<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    ledger: &mut StrongholdLedger,
) -> bool {
    match ctx.gateway.collect_bonus().await {
        Ok(bonus) if bonus.status == BonusStatus::Success => {
            ledger.record_bonus(Instant::now());
            info!(
                outcome = "success",
                currency = bonus.currency,
                stardust = bonus.stardust,
                "collected defender bonus"
            );
            true
        }
        Ok(bonus) => {
            info!(reason = bonus.status.reason(), "defender bonus not collected");
            false
        }
        Err(err) => {
            warn!(error = %err, "defender bonus request failed");
            false
        }
    }
}
